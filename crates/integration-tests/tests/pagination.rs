//! Search and pagination behavior, in memory.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use ecommerce_core::{DeletePolicy, PageRequest};
use ecommerce_integration_tests::{category, product, shop};
use ecommerce_store::Repositories;
use ecommerce_store::entities::Slider;

async fn sliders(repos: &Repositories, count: usize) {
    for i in 0..count {
        repos
            .sliders()
            .create(Slider {
                name: format!("Banner {i:02}"),
                image: format!("/images/{i}.jpg"),
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_pages_partition_the_result_set() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 23).await;

    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for page in 1..=3 {
        let result = repos
            .sliders()
            .find_all(&PageRequest::new("", page, 10))
            .await
            .unwrap();
        assert_eq!(result.total, 23);
        assert_eq!(result.page, u64::try_from(page).unwrap());
        assert_eq!(result.page_size, 10);
        for item in result.items {
            assert!(seen.insert(item.id));
            names.push(item.name.clone());
        }
    }
    assert_eq!(seen.len(), 23);

    // Creation order is stable across pages.
    let expected: Vec<String> = (0..23).map(|i| format!("Banner {i:02}")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_twenty_five_records_in_pages_of_ten() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 25).await;

    let mut sizes = Vec::new();
    for page in 1..=4 {
        let result = repos
            .sliders()
            .find_active(&PageRequest::new("", page, 10))
            .await
            .unwrap();
        assert_eq!(result.total, 25);
        sizes.push(result.items.len());
    }
    assert_eq!(sizes, [10, 10, 5, 0]);

    let last = repos
        .sliders()
        .find_active(&PageRequest::new("", 3, 10))
        .await
        .unwrap();
    assert_eq!(last.items[0].name, "Banner 20");
    assert_eq!(last.items[4].name, "Banner 24");
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 5).await;

    let result = repos
        .sliders()
        .find_all(&PageRequest::new("", 4, 10))
        .await
        .unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total, 5);
}

#[tokio::test]
async fn test_invalid_paging_falls_back_to_defaults() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 12).await;

    let result = repos
        .sliders()
        .find_all(&PageRequest::new("", 0, -5))
        .await
        .unwrap();
    assert_eq!(result.page, 1);
    assert_eq!(result.page_size, 10);
    assert_eq!(result.items.len(), 10);
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 12).await;

    let result = repos
        .sliders()
        .find_all(&PageRequest::new("banner 1", 1, 50))
        .await
        .unwrap();
    // Banner 10 and Banner 11.
    assert_eq!(result.total, 2);

    let none = repos
        .sliders()
        .find_all(&PageRequest::new("missing", 1, 50))
        .await
        .unwrap();
    assert_eq!(none.total, 0);
    assert!(none.items.is_empty());
}

#[tokio::test]
async fn test_like_wildcards_are_literal() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 3).await;
    repos
        .sliders()
        .create(Slider {
            name: "100% off".to_string(),
            image: "/images/sale.jpg".to_string(),
        })
        .await
        .unwrap();

    let result = repos
        .sliders()
        .find_all(&PageRequest::new("%", 1, 50))
        .await
        .unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].name, "100% off");
}

#[tokio::test]
async fn test_active_and_trashed_listings_split_records() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 6).await;
    let all = repos.sliders().find_all(&PageRequest::first()).await.unwrap();
    for item in all.items.iter().step_by(2) {
        repos.sliders().trash(item.id).await.unwrap();
    }

    let active = repos.sliders().find_active(&PageRequest::first()).await.unwrap();
    let trashed = repos.sliders().find_trashed(&PageRequest::first()).await.unwrap();
    assert_eq!(active.total, 3);
    assert_eq!(trashed.total, 3);
    assert!(active.items.iter().all(|r| r.is_active()));
    assert!(trashed.items.iter().all(|r| r.is_trashed()));

    let all = repos.sliders().find_all(&PageRequest::first()).await.unwrap();
    assert_eq!(all.total, 6);
}

#[tokio::test]
async fn test_search_combines_with_lifecycle_filter() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    sliders(&repos, 12).await;
    let hit = repos
        .sliders()
        .find_all(&PageRequest::new("Banner 10", 1, 10))
        .await
        .unwrap();
    repos.sliders().trash(hit.items[0].id).await.unwrap();

    let active = repos
        .sliders()
        .find_active(&PageRequest::new("banner 1", 1, 10))
        .await
        .unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].name, "Banner 11");

    let trashed = repos
        .sliders()
        .find_trashed(&PageRequest::new("banner 1", 1, 10))
        .await
        .unwrap();
    assert_eq!(trashed.total, 1);
    assert_eq!(trashed.items[0].name, "Banner 10");
}

#[tokio::test]
async fn test_products_by_category_and_merchant() {
    let repos = Repositories::in_memory(DeletePolicy::AnyState);
    let shop = shop(&repos).await.unwrap();
    let other_category = repos.categories().create(category("Hats")).await.unwrap().id;

    for name in ["Cap", "Beanie"] {
        repos
            .products()
            .create(product(shop.merchant, other_category, name, Decimal::new(1500, 2)))
            .await
            .unwrap();
    }

    let hats = repos
        .products()
        .find_by_category(other_category, &PageRequest::first())
        .await
        .unwrap();
    assert_eq!(hats.total, 2);

    let everything = repos
        .products()
        .find_by_merchant(shop.merchant, &PageRequest::first())
        .await
        .unwrap();
    assert_eq!(everything.total, 3);

    // Trashed products drop out of relation queries.
    repos.products().trash(shop.product).await.unwrap();
    let everything = repos
        .products()
        .find_by_merchant(shop.merchant, &PageRequest::first())
        .await
        .unwrap();
    assert_eq!(everything.total, 2);

    // Search applies within the relation.
    let caps = repos
        .products()
        .find_by_category(other_category, &PageRequest::new("cap", 1, 10))
        .await
        .unwrap();
    assert_eq!(caps.total, 1);
}
