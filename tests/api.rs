mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use xtech_storefront::{models::Category, routes::create_app};

use common::{memory_state, product};

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn sign_up(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], email);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn shopping_flow_over_http() {
    let (state, store) = memory_state();
    let watch = product(store.as_ref(), "Orbit Watch", "19.99", Category::Wearables).await;
    let app = create_app(state);
    let token = sign_up(&app, "ada@xtech.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(&token),
        Some(json!({ "product_id": watch.id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Quantity defaults to one.
    send(&app, Method::POST, "/api/cart", Some(&token), Some(json!({ "product_id": watch.id }))).await;

    let (status, cart) = send(&app, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["data"]["items"][0]["quantity"], 3);
    assert_eq!(cart["data"]["total"], "59.97");

    let (status, placed) = send(
        &app,
        Method::POST,
        "/api/orders/checkout",
        Some(&token),
        Some(json!({ "shipping_address": "1 Main St" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["data"]["order"]["total_amount"], "59.97");
    assert_eq!(placed["data"]["order"]["status"], "pending");

    let (_, cart) = send(&app, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders/checkout",
        Some(&token),
        Some(json!({ "shipping_address": "1 Main St" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");

    let (status, orders) = send(&app, Method::GET, "/api/profile/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders["meta"]["total"], 1);
}

#[tokio::test]
async fn auth_errors_map_to_status_codes() {
    let (state, _) = memory_state();
    let app = create_app(state);
    sign_up(&app, "ada@xtech.test").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": "ada@xtech.test", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Bo", "email": "bo@xtech.test", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@xtech.test", "password": "wrong!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = send(&app, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/cart", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_can_be_read_and_patched() {
    let (state, _) = memory_state();
    let app = create_app(state);
    let token = sign_up(&app, "ada@xtech.test").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/profile",
        Some(&token),
        Some(json!({ "city": "Lisbon" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["city"], "Lisbon");

    let (_, body) = send(&app, Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(body["data"]["city"], "Lisbon");
    assert_eq!(body["data"]["name"], "Ada");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn admin_surface_is_forbidden_to_customers() {
    let (state, _) = memory_state();
    let app = create_app(state);
    let token = sign_up(&app, "ada@xtech.test").await;

    let (status, _) = send(&app, Method::GET, "/api/admin/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/products",
        Some(&token),
        Some(json!({ "name": "X", "price": "1.00", "category": "Audio" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_is_public_and_unknown_paths_are_json_404() {
    let (state, store) = memory_state();
    product(store.as_ref(), "Nova X1", "799.99", Category::Smartphones).await;
    product(store.as_ref(), "Pulse Buds", "49.00", Category::Audio).await;
    let app = create_app(state);

    let (status, body) = send(&app, Method::GET, "/api/products?category=Audio&per_page=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["per_page"], 5);
    assert_eq!(body["data"]["items"][0]["name"], "Pulse Buds");
    assert_eq!(body["data"]["items"][0]["discount_percent"], 0);

    let (status, body) = send(&app, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
}
