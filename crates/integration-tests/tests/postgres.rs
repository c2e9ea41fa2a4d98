//! Repository contracts against a real `PostgreSQL` database.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `DATABASE_URL` pointing at a scratch database (migrations are applied)
//!
//! Run with: cargo test -p ecommerce-integration-tests -- --ignored
//!
//! Other tests may share the database, so assertions are scoped to records
//! created here (unique slugs and emails, or per-test parents).

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use ecommerce_core::{DeletePolicy, PageRequest};
use ecommerce_integration_tests::{
    cart, category, order, order_item, pg_repositories, product, review, shipping_address, shop,
    unique, user,
};
use ecommerce_store::entities::Role;
use ecommerce_store::{EntityKind, RepositoryError};

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_trash_restore_delete() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let created = repos.categories().create(category("Lamps")).await.unwrap();
    assert!(created.is_active());

    let trashed = repos.categories().trash(created.id).await.unwrap();
    assert!(trashed.deleted_at.is_some());
    let again = repos.categories().trash(created.id).await.unwrap();
    assert_eq!(trashed.deleted_at, again.deleted_at);

    let restored = repos.categories().restore(created.id).await.unwrap();
    assert!(restored.is_active());
    assert!(repos.categories().restore(created.id).await.unwrap_err().is_not_found());

    repos.categories().delete_permanent(created.id).await.unwrap();
    assert!(
        repos
            .categories()
            .find_by_id(created.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_trashed_only_policy() {
    let repos = pg_repositories(DeletePolicy::TrashedOnly).await.unwrap();
    let id = repos.categories().create(category("Rugs")).await.unwrap().id;

    assert!(repos.categories().delete_permanent(id).await.unwrap_err().is_not_found());
    assert!(repos.categories().find_by_id(id).await.unwrap().is_active());

    repos.categories().trash(id).await.unwrap();
    repos.categories().delete_permanent(id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_stats_count_both_states() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let before = repos.stats(EntityKind::Category).await.unwrap();

    let id = repos.categories().create(category("Vases")).await.unwrap().id;
    repos.categories().create(category("Bowls")).await.unwrap();
    repos.categories().trash(id).await.unwrap();

    let after = repos.stats(EntityKind::Category).await.unwrap();
    assert!(after.total() >= before.total() + 2);
    assert!(after.trashed >= 1);
}

// ============================================================================
// Constraints
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_unique_email_conflict() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let erin = repos.users().create(user("Erin")).await.unwrap();
    repos.users().trash(erin.id).await.unwrap();

    let mut twin = user("Erin");
    twin.email = erin.email.clone();
    let err = repos.users().create(twin).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert!(repos.users().find_by_email(&erin.email).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_validation_rejects_bad_rows() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let shop = shop(&repos).await.unwrap();

    let err = repos
        .reviews()
        .create(review(shop.owner, shop.product, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    let err = repos.products().update_stock(shop.product, -4).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_missing_parent_is_conflict() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let shop = shop(&repos).await.unwrap();

    let err = repos
        .order_items()
        .create(order_item(
            ecommerce_core::OrderId::new(i32::MAX),
            shop.product,
            1,
            Decimal::ONE,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_search_and_paging() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let shop = shop(&repos).await.unwrap();
    let tag = unique("Widget");

    for i in 0..15 {
        repos
            .products()
            .create(product(
                shop.merchant,
                shop.category,
                &format!("{tag} {i}"),
                Decimal::new(100, 0),
            ))
            .await
            .unwrap();
    }

    let first = repos
        .products()
        .find_all(&PageRequest::new(tag.to_uppercase(), 1, 10))
        .await
        .unwrap();
    assert_eq!(first.total, 15);
    assert_eq!(first.items.len(), 10);

    let second = repos
        .products()
        .find_all(&PageRequest::new(tag.as_str(), 2, 10))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 5);
    assert!(first.items.iter().all(|a| second.items.iter().all(|b| a.id != b.id)));

    let in_category = repos
        .products()
        .find_by_category(shop.category, &PageRequest::new("", 1, 50))
        .await
        .unwrap();
    assert_eq!(in_category.total, 16);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_order_total_and_cascade() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let shop = shop(&repos).await.unwrap();
    let order_id = repos
        .orders()
        .create(order(shop.merchant, shop.owner))
        .await
        .unwrap()
        .id;

    repos
        .order_items()
        .create(order_item(order_id, shop.product, 4, Decimal::new(250, 2)))
        .await
        .unwrap();
    let trashed = repos
        .order_items()
        .create(order_item(order_id, shop.product, 1, Decimal::new(5000, 2)))
        .await
        .unwrap()
        .id;
    repos.order_items().trash(trashed).await.unwrap();
    repos
        .shipping_addresses()
        .create(shipping_address(order_id))
        .await
        .unwrap();

    let updated = repos.refresh_order_total(order_id).await.unwrap();
    assert_eq!(updated.total_price, Decimal::new(1000, 2));

    // Removing the order removes its items and address.
    repos.orders().delete_permanent(order_id).await.unwrap();
    assert!(repos.order_items().find_by_order(order_id).await.unwrap().is_empty());
    assert!(
        repos
            .shipping_addresses()
            .find_by_order(order_id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(repos.order_items().find_by_id(trashed).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_roles_and_cart_checkout() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let shop = shop(&repos).await.unwrap();
    let role = repos.roles().create(Role::new(unique("buyer"))).await.unwrap();

    repos.assign_role(shop.owner, role.id).await.unwrap();
    let roles = repos.roles_for_user(shop.owner).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].id, role.id);

    let found = repos.roles().find_by_name(&role.name.to_uppercase()).await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(role.id));

    let mut lines = Vec::new();
    for quantity in 1..=3 {
        lines.push(
            repos
                .carts()
                .create(cart(shop.owner, shop.product, quantity))
                .await
                .unwrap()
                .id,
        );
    }
    assert_eq!(repos.carts().delete_many(&lines).await.unwrap(), 3);
    assert_eq!(
        repos
            .carts()
            .find_by_user(shop.owner, &PageRequest::first())
            .await
            .unwrap()
            .total,
        0
    );

    repos.remove_role(shop.owner, role.id).await.unwrap();
    assert!(repos.roles_for_user(shop.owner).await.unwrap().is_empty());
    assert!(
        repos
            .user_roles()
            .find_assignment(shop.owner, role.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires running PostgreSQL"]
async fn test_pg_concurrent_trash_and_restore_never_tear() {
    let repos = pg_repositories(DeletePolicy::AnyState).await.unwrap();
    let created = repos.categories().create(category("Lanterns")).await.unwrap();
    let id = created.id;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let trasher = repos.clone();
        handles.push(tokio::spawn(async move {
            trasher.categories().trash(id).await.map(|_| ())
        }));
        let restorer = repos.clone();
        handles.push(tokio::spawn(async move {
            restorer.categories().restore(id).await.map(|_| ())
        }));
    }
    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            assert!(err.is_not_found());
        }
    }

    let record = repos.categories().find_by_id(id).await.unwrap();
    let search = PageRequest::new(created.slug_category.as_str(), 1, 10);
    let active = repos.categories().find_active(&search).await.unwrap();
    let trashed = repos.categories().find_trashed(&search).await.unwrap();
    let in_active = active.items.iter().any(|r| r.id == id);
    let in_trashed = trashed.items.iter().any(|r| r.id == id);

    assert_eq!(record.deleted_at.is_some(), in_trashed);
    assert_eq!(record.deleted_at.is_none(), in_active);
    assert_ne!(in_active, in_trashed);
}
