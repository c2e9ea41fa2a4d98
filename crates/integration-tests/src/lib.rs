//! Integration tests for the e-commerce store.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory tests need nothing else
//! cargo test -p ecommerce-integration-tests
//!
//! # PostgreSQL tests need DATABASE_URL pointing at a scratch database
//! cargo test -p ecommerce-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `lifecycle` - Trash / restore / delete state machine across entities
//! - `pagination` - Search, paging and lifecycle filters
//! - `relations` - Role assignment, order totals, cart checkout
//! - `postgres` - The same contracts against a real database
//!
//! Fixtures here build valid records with sensible defaults so tests only
//! spell out the fields they care about.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicU32, Ordering};

use rust_decimal::Decimal;
use sqlx::PgPool;

use ecommerce_core::{
    CategoryId, DeletePolicy, Email, MerchantId, MerchantStatus, OrderId, PaymentStatus,
    ProductId, UserId,
};
use ecommerce_store::entities::{
    Cart, Category, Merchant, Order, OrderItem, Product, Review, ShippingAddress, Transaction,
    User,
};
use ecommerce_store::{Repositories, db};

// ============================================================================
// Unique values
// ============================================================================

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A token unique within this process and, with high probability, across
/// runs sharing one database.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos());
    format!("{prefix}-{}-{nanos}-{n}", std::process::id())
}

// ============================================================================
// Record builders
// ============================================================================

/// A user with a unique email.
///
/// # Panics
///
/// Never; generated emails are always valid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn user(first_name: &str) -> User {
    let email = Email::parse(&format!("{}@example.com", unique(&first_name.to_lowercase())))
        .expect("generated email is valid");
    User {
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email,
        password_hash: "$argon2id$v=19$placeholder".to_string(),
    }
}

#[must_use]
pub fn category(name: &str) -> Category {
    Category {
        name: name.to_string(),
        description: format!("All things {name}"),
        slug_category: unique(&name.to_lowercase()),
        image_category: None,
    }
}

#[must_use]
pub fn merchant(user: UserId, name: &str) -> Merchant {
    Merchant {
        user_id: user,
        name: name.to_string(),
        description: String::new(),
        address: "1 Market Street".to_string(),
        contact_email: "shop@example.com".to_string(),
        contact_phone: "+1 555 0100".to_string(),
        status: MerchantStatus::Active,
    }
}

#[must_use]
pub fn product(merchant: MerchantId, category: CategoryId, name: &str, price: Decimal) -> Product {
    Product {
        merchant_id: merchant,
        category_id: category,
        name: name.to_string(),
        description: String::new(),
        price,
        count_in_stock: 10,
        brand: "Acme".to_string(),
        weight: 250,
        slug_product: unique(&name.to_lowercase().replace(' ', "-")),
        image_product: None,
        barcode: None,
    }
}

#[must_use]
pub const fn order(merchant: MerchantId, user: UserId) -> Order {
    Order {
        merchant_id: merchant,
        user_id: user,
        total_price: Decimal::ZERO,
    }
}

#[must_use]
pub const fn order_item(order: OrderId, product: ProductId, quantity: i32, price: Decimal) -> OrderItem {
    OrderItem {
        order_id: order,
        product_id: product,
        quantity,
        price,
    }
}

#[must_use]
pub fn cart(user: UserId, product: ProductId, quantity: i32) -> Cart {
    Cart {
        user_id: user,
        product_id: product,
        name: "Cart line".to_string(),
        price: Decimal::new(1999, 2),
        image: None,
        quantity,
        weight: 250,
    }
}

#[must_use]
pub fn review(user: UserId, product: ProductId, rating: i32) -> Review {
    Review {
        user_id: user,
        product_id: product,
        name: "Reviewer".to_string(),
        comment: "Does what it says".to_string(),
        rating,
    }
}

#[must_use]
pub fn transaction(order: OrderId, merchant: MerchantId, amount: Decimal) -> Transaction {
    Transaction {
        order_id: order,
        merchant_id: merchant,
        payment_method: "cash".to_string(),
        amount,
        change_amount: Decimal::ZERO,
        payment_status: PaymentStatus::Success,
    }
}

#[must_use]
pub fn shipping_address(order: OrderId) -> ShippingAddress {
    ShippingAddress {
        order_id: order,
        address: "1 Main Street".to_string(),
        province: "Ontario".to_string(),
        city: "Toronto".to_string(),
        country: "Canada".to_string(),
        courier: "Canada Post".to_string(),
        shipping_method: "standard".to_string(),
        shipping_cost: Decimal::new(500, 2),
    }
}

// ============================================================================
// Scenario setup
// ============================================================================

/// Ids of a merchant with one product, owned by a fresh user.
#[derive(Debug, Clone, Copy)]
pub struct Shop {
    pub owner: UserId,
    pub merchant: MerchantId,
    pub category: CategoryId,
    pub product: ProductId,
}

/// Create a user, category, merchant and product.
///
/// # Errors
///
/// Returns the first repository error.
pub async fn shop(repos: &Repositories) -> Result<Shop, ecommerce_store::RepositoryError> {
    let owner = repos.users().create(user("Owner")).await?.id;
    let category = repos.categories().create(category("Shoes")).await?.id;
    let merchant = repos.merchants().create(merchant(owner, "Shoe Shop")).await?.id;
    let product = repos
        .products()
        .create(product(merchant, category, "Trail Runner", Decimal::new(8999, 2)))
        .await?
        .id;
    Ok(Shop {
        owner,
        merchant,
        category,
        product,
    })
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// Connect to `DATABASE_URL` and apply migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the database is unreachable,
/// or a migration fails.
pub async fn pg_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL")?;
    let pool = PgPool::connect(&url).await?;
    db::migrate(&pool).await?;
    Ok(pool)
}

/// Repositories over a migrated test database.
///
/// # Errors
///
/// Same as [`pg_pool`].
pub async fn pg_repositories(policy: DeletePolicy) -> Result<Repositories, Box<dyn std::error::Error>> {
    Ok(Repositories::postgres(pg_pool().await?, policy))
}
