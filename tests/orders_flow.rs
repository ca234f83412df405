mod common;

use xtech_storefront::{
    error::AppError,
    models::{Category, OrderStatus},
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, cart_service, order_service},
    store::{OrderDraft, OrderLineDraft, ProductPatch, Store, StoreError},
};

use common::{admin, customer, dec, memory_state, product, register, unknown_id};

#[tokio::test]
async fn checkout_snapshots_prices_and_empties_cart() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;

    cart_service::add_to_cart(&state, user.id, watch.id, 3).await.unwrap();
    let placed = order_service::create_order_from_cart(&state, user.id, "1 Main St")
        .await
        .unwrap();

    assert_eq!(placed.order.total_amount, dec("59.97"));
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.shipping_address, "1 Main St");
    assert!(placed.order.order_number.starts_with("ORD-"));
    assert!(placed.order.order_number[4..].chars().all(|c| c.is_ascii_digit()));

    assert_eq!(placed.items.len(), 1);
    let item = &placed.items[0];
    assert_eq!(item.product_id, watch.id);
    assert_eq!(item.quantity, 3);
    assert_eq!(item.unit_price, dec("19.99"));
    assert_eq!(item.total_price, dec("59.97"));

    assert!(cart_service::get_cart_items(&state, user.id).await.unwrap().is_empty());

    // Later price changes do not touch the placed order.
    store
        .update_product(
            watch.id,
            ProductPatch {
                price: Some(dec("24.99")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let fetched = order_service::get_order(&state, user.id, placed.order.id)
        .await
        .unwrap();
    assert_eq!(fetched.order.total_amount, dec("59.97"));
    assert_eq!(fetched.items[0].item.unit_price, dec("19.99"));
    assert_eq!(fetched.items[0].product.as_ref().unwrap().name, "Orbit Watch");
}

#[tokio::test]
async fn total_is_the_sum_of_line_totals() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    let laptop = product(store.as_ref(), "Pixelbook Air", "1299.00", Category::Laptops).await;

    cart_service::add_to_cart(&state, user.id, watch.id, 3).await.unwrap();
    cart_service::add_to_cart(&state, user.id, laptop.id, 1).await.unwrap();
    let placed = order_service::create_order_from_cart(&state, user.id, "1 Main St")
        .await
        .unwrap();

    let sum: rust_decimal::Decimal = placed.items.iter().map(|i| i.total_price).sum();
    assert_eq!(placed.order.total_amount, sum);
    assert_eq!(placed.order.total_amount, dec("1358.97"));
}

#[tokio::test]
async fn empty_cart_creates_nothing() {
    let (state, _) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;

    let result = order_service::create_order_from_cart(&state, user.id, "1 Main St").await;
    assert!(matches!(result, Err(AppError::EmptyCart)));

    let (orders, total) = order_service::list_user_orders(&state, user.id, Pagination::new(None, None))
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn blank_shipping_address_is_rejected() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    cart_service::add_to_cart(&state, user.id, watch.id, 1).await.unwrap();

    let result = order_service::create_order_from_cart(&state, user.id, "   ").await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(cart_service::get_cart_items(&state, user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn back_to_back_checkouts_get_distinct_numbers() {
    let (state, store) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let grace = register(&state, "Grace", "grace@xtech.test", "secret2").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;

    cart_service::add_to_cart(&state, ada.id, watch.id, 1).await.unwrap();
    cart_service::add_to_cart(&state, grace.id, watch.id, 1).await.unwrap();
    let first = order_service::create_order_from_cart(&state, ada.id, "A").await.unwrap();
    let second = order_service::create_order_from_cart(&state, grace.id, "B").await.unwrap();

    assert_ne!(first.order.order_number, second.order.order_number);
}

#[tokio::test]
async fn stale_draft_writes_nothing() {
    let (state, store) = memory_state();
    let user = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    let item = cart_service::add_to_cart(&state, user.id, watch.id, 2).await.unwrap();

    let draft = OrderDraft {
        user_id: user.id,
        order_number: "ORD-1".into(),
        total_amount: dec("19.99"),
        shipping_address: "1 Main St".into(),
        lines: vec![OrderLineDraft {
            cart_item_id: item.id,
            product_id: watch.id,
            // Read before the quantity moved from 1 to 2.
            quantity: 1,
            unit_price: dec("19.99"),
            total_price: dec("19.99"),
        }],
    };
    let result = store.place_order(draft).await;
    assert!(matches!(result, Err(StoreError::Stale(_))));

    assert_eq!(store.cart_item_count().await, 1);
    let totals = store.order_totals().await.unwrap();
    assert_eq!(totals.count, 0);
}

#[tokio::test]
async fn orders_are_private_to_their_owner() {
    let (state, store) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let grace = register(&state, "Grace", "grace@xtech.test", "secret2").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;

    cart_service::add_to_cart(&state, ada.id, watch.id, 1).await.unwrap();
    let placed = order_service::create_order_from_cart(&state, ada.id, "A").await.unwrap();

    let other = order_service::get_order(&state, grace.id, placed.order.id).await;
    assert!(matches!(other, Err(AppError::NotFound)));

    let (mine, total) = order_service::list_user_orders(&state, ada.id, Pagination::new(None, None))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(mine[0].order.id, placed.order.id);
    assert!(mine[0].customer.is_none());
}

#[tokio::test]
async fn admin_manages_orders_and_sees_stats() {
    let (state, store) = memory_state();
    let boss = admin(&state, &store).await;
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    product(store.as_ref(), "Pulse Buds", "49.00", Category::Audio).await;

    cart_service::add_to_cart(&state, ada.id, watch.id, 3).await.unwrap();
    let placed = order_service::create_order_from_cart(&state, ada.id, "A").await.unwrap();

    let (all, total) = admin_service::list_all_orders(&state, &boss, &OrderListQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    let customer_info = all[0].customer.as_ref().unwrap();
    assert_eq!(customer_info.email, "ada@xtech.test");

    let updated = admin_service::update_order_status(&state, &boss, placed.order.id, "processing")
        .await
        .unwrap();
    assert_eq!(updated.order.status, OrderStatus::Processing);

    let pending = OrderListQuery {
        status: Some(OrderStatus::Pending),
        ..Default::default()
    };
    let (_, pending_total) = admin_service::list_all_orders(&state, &boss, &pending)
        .await
        .unwrap();
    assert_eq!(pending_total, 0);

    let bogus = admin_service::update_order_status(&state, &boss, placed.order.id, "shipped").await;
    assert!(matches!(bogus, Err(AppError::BadRequest(_))));

    let missing = admin_service::get_order_admin(&state, &boss, unknown_id()).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let stats = admin_service::dashboard_stats(&state, &boss).await.unwrap();
    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_sales, dec("59.97"));
    assert_eq!(stats.total_stock, 20);
}

#[tokio::test]
async fn admin_operations_require_admin() {
    let (state, _) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let user = customer(&ada);

    assert!(matches!(
        admin_service::dashboard_stats(&state, &user).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        admin_service::list_all_orders(&state, &user, &OrderListQuery::default()).await,
        Err(AppError::Forbidden)
    ));
}
