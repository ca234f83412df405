mod common;

use xtech_storefront::{
    dto::products::{CreateProductRequest, ProductView, UpdateProductRequest},
    error::AppError,
    models::Category,
    routes::params::{MAX_PAGE, Pagination, ProductQuery},
    services::{cart_service, product_service},
};

use common::{admin, customer, dec, memory_state, product, register};

fn create_request(name: &str, price: &str) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        price: dec(price),
        original_price: None,
        category: Category::Audio,
        stock: 5,
        featured: false,
        is_new: false,
        image_url: None,
        description: None,
    }
}

#[tokio::test]
async fn listing_filters_by_search_category_and_featured() {
    let (state, store) = memory_state();
    let boss = admin(&state, &store).await;
    product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;
    product(store.as_ref(), "Nova Mini", "499.99", Category::Smartphones).await;
    product(store.as_ref(), "Pulse Buds", "49.00", Category::Audio).await;
    let mut featured = create_request("Pulse ANC", "199.99");
    featured.featured = true;
    product_service::create_product(&state, &boss, featured).await.unwrap();

    let search = ProductQuery {
        q: Some("nova".into()),
        ..Default::default()
    };
    let (found, total) = product_service::list_products(&state, &search).await.unwrap();
    assert_eq!(total, 2);
    assert!(found.iter().all(|p| p.name.starts_with("Nova")));

    let audio = ProductQuery {
        category: Some(Category::Audio),
        ..Default::default()
    };
    assert_eq!(product_service::list_products(&state, &audio).await.unwrap().1, 2);

    let only_featured = ProductQuery {
        featured: Some(true),
        ..Default::default()
    };
    let (rows, _) = product_service::list_products(&state, &only_featured).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Pulse ANC");
}

#[tokio::test]
async fn search_treats_wildcard_characters_literally() {
    let (state, store) = memory_state();
    product(store.as_ref(), "Band X_1 Pro", "59.00", Category::Wearables).await;
    product(store.as_ref(), "Band XA1", "49.00", Category::Wearables).await;
    product(store.as_ref(), "Band 50% off", "29.00", Category::Wearables).await;

    let search = |term: &str| ProductQuery {
        q: Some(term.into()),
        ..Default::default()
    };
    let (rows, total) = product_service::list_products(&state, &search("x_1")).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].name, "Band X_1 Pro");

    assert_eq!(product_service::list_products(&state, &search("50%")).await.unwrap().1, 1);
    assert_eq!(product_service::list_products(&state, &search("%")).await.unwrap().1, 1);
}

#[tokio::test]
async fn listing_is_paginated() {
    let (state, store) = memory_state();
    for i in 0..5 {
        product(store.as_ref(), &format!("Item {i}"), "10.00", Category::Tablets).await;
    }

    let page = ProductQuery {
        page: Some(2),
        per_page: Some(2),
        ..Default::default()
    };
    let (rows, total) = product_service::list_products(&state, &page).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn huge_page_number_is_clamped_to_an_empty_page() {
    let window = Pagination::new(Some(u64::MAX), Some(100));
    assert_eq!(window.page, MAX_PAGE);
    assert_eq!(window.offset(), (MAX_PAGE - 1) * 100);
    assert_eq!(Pagination::new(Some(0), Some(0)).offset(), 0);

    let (state, store) = memory_state();
    for i in 0..3 {
        product(store.as_ref(), &format!("Item {i}"), "10.00", Category::Tablets).await;
    }
    let far = ProductQuery {
        page: Some(u64::MAX),
        per_page: Some(100),
        ..Default::default()
    };
    let (rows, total) = product_service::list_products(&state, &far).await.unwrap();
    assert_eq!(total, 3);
    assert!(rows.is_empty());
}

#[tokio::test]
async fn create_validates_and_defaults() {
    let (state, store) = memory_state();
    let boss = admin(&state, &store).await;

    let created = product_service::create_product(&state, &boss, create_request(" Pulse ", "49.00"))
        .await
        .unwrap();
    assert_eq!(created.name, "Pulse");
    assert_eq!(created.rating, 0.0);
    assert_eq!(created.sales, 0);
    assert!(!created.is_new);

    let free = product_service::create_product(&state, &boss, create_request("Free", "0")).await;
    assert!(matches!(free, Err(AppError::BadRequest(_))));

    let unnamed = product_service::create_product(&state, &boss, create_request("  ", "1.00")).await;
    assert!(matches!(unnamed, Err(AppError::BadRequest(_))));

    let mut negative = create_request("Negative", "1.00");
    negative.stock = -1;
    assert!(matches!(
        product_service::create_product(&state, &boss, negative).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn customers_cannot_manage_catalog() {
    let (state, _) = memory_state();
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;

    let result =
        product_service::create_product(&state, &customer(&ada), create_request("X", "1.00")).await;
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn update_and_delete_product() {
    let (state, store) = memory_state();
    let boss = admin(&state, &store).await;
    let ada = register(&state, "Ada", "ada@xtech.test", "secret1").await;
    let buds = product(store.as_ref(), "Pulse Buds", "49.00", Category::Audio).await;

    let updated = product_service::update_product(
        &state,
        &boss,
        buds.id,
        UpdateProductRequest {
            original_price: Some(dec("60.00")),
            rating: Some(4.5),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.rating, 4.5);
    assert_eq!(ProductView::from(updated).discount_percent, 18);

    let bad_rating = product_service::update_product(
        &state,
        &boss,
        buds.id,
        UpdateProductRequest {
            rating: Some(7.0),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_rating, Err(AppError::BadRequest(_))));

    cart_service::add_to_cart(&state, ada.id, buds.id, 1).await.unwrap();
    product_service::delete_product(&state, &boss, buds.id).await.unwrap();
    assert!(matches!(
        product_service::get_product(&state, buds.id).await,
        Err(AppError::NotFound)
    ));
    assert!(cart_service::get_cart_items(&state, ada.id).await.unwrap().is_empty());

    let again = product_service::delete_product(&state, &boss, buds.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));
}
