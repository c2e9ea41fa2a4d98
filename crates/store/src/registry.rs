//! One store per entity behind a single handle.
//!
//! [`Repositories`] is what request handlers hold: clone it freely, it only
//! wraps shared backends. It also carries the operations that span entities,
//! and [`EntityKind`] dispatch for tooling that works on any table by name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use ecommerce_core::{DeletePolicy, LifecycleState, OrderId, RoleId, UserId};

use crate::config::StoreConfig;
use crate::db::{self, MemoryBackend, PgBackend, RecordBackend, RepositoryError};
use crate::entities::{
    Cart, Category, Merchant, Order, OrderItem, Product, Review, Role, ShippingAddress, Slider,
    Transaction, User, UserRole,
};
use crate::record::{Entity, Record};
use crate::store::EntityStore;

/// Every entity the registry manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Role,
    UserRole,
    Category,
    Merchant,
    Order,
    OrderItem,
    Product,
    Transaction,
    Cart,
    Review,
    ShippingAddress,
    Slider,
}

impl EntityKind {
    pub const ALL: [Self; 13] = [
        Self::User,
        Self::Role,
        Self::UserRole,
        Self::Category,
        Self::Merchant,
        Self::Order,
        Self::OrderItem,
        Self::Product,
        Self::Transaction,
        Self::Cart,
        Self::Review,
        Self::ShippingAddress,
        Self::Slider,
    ];

    /// Singular entity name, as used in errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => User::NAME,
            Self::Role => Role::NAME,
            Self::UserRole => UserRole::NAME,
            Self::Category => Category::NAME,
            Self::Merchant => Merchant::NAME,
            Self::Order => Order::NAME,
            Self::OrderItem => OrderItem::NAME,
            Self::Product => Product::NAME,
            Self::Transaction => Transaction::NAME,
            Self::Cart => Cart::NAME,
            Self::Review => Review::NAME,
            Self::ShippingAddress => ShippingAddress::NAME,
            Self::Slider => Slider::NAME,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts singular names (`order_item`), and hyphens in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown entity: {s}"))
    }
}

/// Record counts of one entity by lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    pub kind: EntityKind,
    pub active: u64,
    pub trashed: u64,
}

impl EntityStats {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.active + self.trashed
    }
}

/// Source of one backend per entity.
trait Provision {
    fn backend<E: Entity>(&self) -> Arc<dyn RecordBackend<E>>;
}

struct Postgres(PgPool);

impl Provision for Postgres {
    fn backend<E: Entity>(&self) -> Arc<dyn RecordBackend<E>> {
        Arc::new(PgBackend::<E>::new(self.0.clone()))
    }
}

struct InMemory;

impl Provision for InMemory {
    fn backend<E: Entity>(&self) -> Arc<dyn RecordBackend<E>> {
        Arc::new(MemoryBackend::<E>::new())
    }
}

/// Runs `$body` with `$store` bound to the store of `$kind`.
macro_rules! with_store {
    ($repos:expr, $kind:expr, |$store:ident| $body:expr) => {
        match $kind {
            EntityKind::User => { let $store = &$repos.users; $body }
            EntityKind::Role => { let $store = &$repos.roles; $body }
            EntityKind::UserRole => { let $store = &$repos.user_roles; $body }
            EntityKind::Category => { let $store = &$repos.categories; $body }
            EntityKind::Merchant => { let $store = &$repos.merchants; $body }
            EntityKind::Order => { let $store = &$repos.orders; $body }
            EntityKind::OrderItem => { let $store = &$repos.order_items; $body }
            EntityKind::Product => { let $store = &$repos.products; $body }
            EntityKind::Transaction => { let $store = &$repos.transactions; $body }
            EntityKind::Cart => { let $store = &$repos.carts; $body }
            EntityKind::Review => { let $store = &$repos.reviews; $body }
            EntityKind::ShippingAddress => { let $store = &$repos.shipping_addresses; $body }
            EntityKind::Slider => { let $store = &$repos.sliders; $body }
        }
    };
}

/// Registry of every entity store.
#[derive(Debug, Clone)]
pub struct Repositories {
    users: EntityStore<User>,
    roles: EntityStore<Role>,
    user_roles: EntityStore<UserRole>,
    categories: EntityStore<Category>,
    merchants: EntityStore<Merchant>,
    orders: EntityStore<Order>,
    order_items: EntityStore<OrderItem>,
    products: EntityStore<Product>,
    transactions: EntityStore<Transaction>,
    carts: EntityStore<Cart>,
    reviews: EntityStore<Review>,
    shipping_addresses: EntityStore<ShippingAddress>,
    sliders: EntityStore<Slider>,
}

impl Repositories {
    /// Stores backed by `PostgreSQL` tables sharing `pool`.
    #[must_use]
    pub fn postgres(pool: PgPool, policy: DeletePolicy) -> Self {
        Self::provision(&Postgres(pool), policy)
    }

    /// Stores backed by fresh, empty in-memory tables.
    #[must_use]
    pub fn in_memory(policy: DeletePolicy) -> Self {
        Self::provision(&InMemory, policy)
    }

    /// Open a pool from `config` and build `PostgreSQL` stores on it.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the database cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        let pool = db::create_pool(config).await?;
        Ok(Self::postgres(pool, config.delete_policy))
    }

    fn provision(source: &impl Provision, policy: DeletePolicy) -> Self {
        Self {
            users: EntityStore::new(source.backend(), policy),
            roles: EntityStore::new(source.backend(), policy),
            user_roles: EntityStore::new(source.backend(), policy),
            categories: EntityStore::new(source.backend(), policy),
            merchants: EntityStore::new(source.backend(), policy),
            orders: EntityStore::new(source.backend(), policy),
            order_items: EntityStore::new(source.backend(), policy),
            products: EntityStore::new(source.backend(), policy),
            transactions: EntityStore::new(source.backend(), policy),
            carts: EntityStore::new(source.backend(), policy),
            reviews: EntityStore::new(source.backend(), policy),
            shipping_addresses: EntityStore::new(source.backend(), policy),
            sliders: EntityStore::new(source.backend(), policy),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn users(&self) -> &EntityStore<User> {
        &self.users
    }

    #[must_use]
    pub const fn roles(&self) -> &EntityStore<Role> {
        &self.roles
    }

    #[must_use]
    pub const fn user_roles(&self) -> &EntityStore<UserRole> {
        &self.user_roles
    }

    #[must_use]
    pub const fn categories(&self) -> &EntityStore<Category> {
        &self.categories
    }

    #[must_use]
    pub const fn merchants(&self) -> &EntityStore<Merchant> {
        &self.merchants
    }

    #[must_use]
    pub const fn orders(&self) -> &EntityStore<Order> {
        &self.orders
    }

    #[must_use]
    pub const fn order_items(&self) -> &EntityStore<OrderItem> {
        &self.order_items
    }

    #[must_use]
    pub const fn products(&self) -> &EntityStore<Product> {
        &self.products
    }

    #[must_use]
    pub const fn transactions(&self) -> &EntityStore<Transaction> {
        &self.transactions
    }

    #[must_use]
    pub const fn carts(&self) -> &EntityStore<Cart> {
        &self.carts
    }

    #[must_use]
    pub const fn reviews(&self) -> &EntityStore<Review> {
        &self.reviews
    }

    #[must_use]
    pub const fn shipping_addresses(&self) -> &EntityStore<ShippingAddress> {
        &self.shipping_addresses
    }

    #[must_use]
    pub const fn sliders(&self) -> &EntityStore<Slider> {
        &self.sliders
    }

    // =========================================================================
    // Cross-entity operations
    // =========================================================================

    /// Grant `role` to `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already holds the role
    /// (even a trashed assignment), or if either record is missing.
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        user: UserId,
        role: RoleId,
    ) -> Result<Record<UserRole>, RepositoryError> {
        self.user_roles
            .create(UserRole {
                user_id: user,
                role_id: role,
            })
            .await
    }

    /// Permanently revoke `role` from `user`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no Active
    /// assignment of the role.
    #[instrument(skip(self))]
    pub async fn remove_role(&self, user: UserId, role: RoleId) -> Result<(), RepositoryError> {
        let assignment = self
            .user_roles
            .find_assignment(user, role)
            .await?
            .ok_or_else(|| RepositoryError::not_found(UserRole::NAME, format!("{user}/{role}")))?;
        self.user_roles.delete_permanent(assignment.id).await
    }

    /// Active roles held by `user` through Active assignments, in assignment order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if a backend fails.
    pub async fn roles_for_user(&self, user: UserId) -> Result<Vec<Record<Role>>, RepositoryError> {
        let mut roles = Vec::new();
        for assignment in self.user_roles.find_by_user(user).await? {
            match self.roles.find_by_id(assignment.role_id).await {
                Ok(role) if role.is_active() => roles.push(role),
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(roles)
    }

    /// Recompute an order's `total_price` from its Active items and store it.
    ///
    /// The sum and the write are separate steps: an item created, trashed or
    /// restored in between is not reflected until the next refresh. Call this
    /// after every item change of the order; the latest call always wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn refresh_order_total(&self, order: OrderId) -> Result<Record<Order>, RepositoryError> {
        let total: Decimal = self.order_items.calculate_total_price(order).await?;
        let updated = self.orders.set_total_price(order, total).await?;
        info!(%total, "order total refreshed");
        Ok(updated)
    }

    // =========================================================================
    // Dispatch by kind
    // =========================================================================

    /// [`EntityStore::restore_all`] on the store of `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::restore_all`].
    pub async fn restore_all(&self, kind: EntityKind) -> Result<u64, RepositoryError> {
        with_store!(self, kind, |store| store.restore_all().await)
    }

    /// [`EntityStore::delete_all_permanent`] on the store of `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::delete_all_permanent`].
    pub async fn delete_all_permanent(&self, kind: EntityKind) -> Result<u64, RepositoryError> {
        with_store!(self, kind, |store| store.delete_all_permanent().await)
    }

    /// Active and Trashed record counts of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend fails.
    pub async fn stats(&self, kind: EntityKind) -> Result<EntityStats, RepositoryError> {
        let (active, trashed) = with_store!(self, kind, |store| (
            store.count(LifecycleState::Active).await?,
            store.count(LifecycleState::Trashed).await?
        ));
        Ok(EntityStats {
            kind,
            active,
            trashed,
        })
    }
}
