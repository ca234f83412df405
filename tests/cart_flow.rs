mod common;

use std::sync::Arc;

use xtech_storefront::{
    error::AppError,
    models::Category,
    services::cart_service::{self, MAX_CART_QUANTITY},
    store::{Store, StoreError},
};

use common::{dec, memory_state, product, register, unknown_id};

#[tokio::test]
async fn repeated_adds_merge_into_one_line() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;

    cart_service::add_to_cart(&state, user.id, phone.id, 2).await.unwrap();
    let merged = cart_service::add_to_cart(&state, user.id, phone.id, 3).await.unwrap();
    assert_eq!(merged.quantity, 5);

    let lines = cart_service::get_cart_items(&state, user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
    assert_eq!(lines[0].product.name, "Nova X1");
    assert_eq!(lines[0].product.price, dec("799.99"));
}

#[tokio::test]
async fn concurrent_adds_of_the_same_product_do_not_lose_increments() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let buds = product(store.as_ref(), "Pulse Buds", "49.00", Category::Audio).await;

    let (user_id, product_id) = (user.id, buds.id);
    let state = Arc::new(state);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            cart_service::add_to_cart(&state, user_id, product_id, 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let lines = cart_service::get_cart_items(&state, user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 8);
    assert_eq!(store.cart_item_count().await, 1);
}

#[tokio::test]
async fn add_rejects_bad_quantity_and_unknown_product() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;

    let zero = cart_service::add_to_cart(&state, user.id, phone.id, 0).await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let missing = cart_service::add_to_cart(&state, user.id, unknown_id(), 1).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    assert_eq!(store.cart_item_count().await, 0);
}

#[tokio::test]
async fn merged_quantity_is_capped() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;

    let huge = cart_service::add_to_cart(&state, user.id, phone.id, i32::MAX).await;
    assert!(matches!(huge, Err(AppError::BadRequest(_))));

    let item = cart_service::add_to_cart(&state, user.id, phone.id, MAX_CART_QUANTITY)
        .await
        .unwrap();
    let over = cart_service::add_to_cart(&state, user.id, phone.id, 1).await;
    assert!(matches!(over, Err(AppError::BadRequest(_))));

    let set = cart_service::update_cart_quantity(&state, user.id, item.id, i32::MAX).await;
    assert!(matches!(set, Err(AppError::BadRequest(_))));

    let lines = cart_service::get_cart_items(&state, user.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, MAX_CART_QUANTITY);
}

#[tokio::test]
async fn memory_store_merge_overflow_is_an_error() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;

    store.add_cart_quantity(user.id, phone.id, i32::MAX).await.unwrap();
    let overflow = store.add_cart_quantity(user.id, phone.id, 1).await;
    assert!(matches!(overflow, Err(StoreError::OutOfRange(_))));

    let lines = store.cart_lines(user.id).await.unwrap();
    assert_eq!(lines[0].quantity, i32::MAX);
}

#[tokio::test]
async fn update_quantity_overwrites_and_non_positive_removes() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;
    let item = cart_service::add_to_cart(&state, user.id, phone.id, 2).await.unwrap();

    cart_service::update_cart_quantity(&state, user.id, item.id, 7).await.unwrap();
    let lines = cart_service::get_cart_items(&state, user.id).await.unwrap();
    assert_eq!(lines[0].quantity, 7);

    cart_service::update_cart_quantity(&state, user.id, item.id, 0).await.unwrap();
    assert!(cart_service::get_cart_items(&state, user.id).await.unwrap().is_empty());

    let item = cart_service::add_to_cart(&state, user.id, phone.id, 1).await.unwrap();
    cart_service::update_cart_quantity(&state, user.id, item.id, -3).await.unwrap();
    assert!(cart_service::get_cart_items(&state, user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_and_remove_of_absent_line_succeed() {
    let (state, _) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;

    cart_service::update_cart_quantity(&state, user.id, unknown_id(), 4).await.unwrap();
    cart_service::remove_from_cart(&state, user.id, unknown_id()).await.unwrap();
}

#[tokio::test]
async fn remove_is_idempotent_and_scoped_to_owner() {
    let (state, store) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let grace = register(&state, "Grace", "grace@xtech.test", "secret2").await;
    let tablet = product(store.as_ref(), "Slate 11", "449.50", Category::Tablets).await;
    let item = cart_service::add_to_cart(&state, ada.id, tablet.id, 1).await.unwrap();

    // Someone else's id does nothing.
    cart_service::remove_from_cart(&state, grace.id, item.id).await.unwrap();
    cart_service::update_cart_quantity(&state, grace.id, item.id, 9).await.unwrap();
    let lines = cart_service::get_cart_items(&state, ada.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 1);

    cart_service::remove_from_cart(&state, ada.id, item.id).await.unwrap();
    cart_service::remove_from_cart(&state, ada.id, item.id).await.unwrap();
    assert!(cart_service::get_cart_items(&state, ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_cart_only_touches_own_lines() {
    let (state, store) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let grace = register(&state, "Grace", "grace@xtech.test", "secret2").await;
    let phone = product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;

    cart_service::add_to_cart(&state, ada.id, phone.id, 1).await.unwrap();
    cart_service::add_to_cart(&state, ada.id, watch.id, 2).await.unwrap();
    cart_service::add_to_cart(&state, grace.id, watch.id, 1).await.unwrap();

    cart_service::clear_cart(&state, ada.id).await.unwrap();
    assert!(cart_service::get_cart_items(&state, ada.id).await.unwrap().is_empty());
    assert_eq!(cart_service::get_cart_items(&state, grace.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cart_lines_are_oldest_first_with_total() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    let buds = product(store.as_ref(), "Pulse Buds", "49.50", Category::Audio).await;

    cart_service::add_to_cart(&state, user.id, watch.id, 3).await.unwrap();
    cart_service::add_to_cart(&state, user.id, buds.id, 2).await.unwrap();

    let lines = cart_service::get_cart_items(&state, user.id).await.unwrap();
    let names: Vec<_> = lines.iter().map(|l| l.product.name.as_str()).collect();
    assert_eq!(names, ["Orbit Watch", "Pulse Buds"]);
    assert_eq!(cart_service::cart_total(&lines), dec("158.97"));
}
