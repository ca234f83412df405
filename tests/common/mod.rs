#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use uuid::Uuid;
use xtech_storefront::{
    config::AppConfig,
    dto::auth::RegisterRequest,
    middleware::auth::AuthUser,
    models::{Category, Product, User},
    services::auth_service,
    state::AppState,
    store::{MemoryStore, NewProduct, Store},
};

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        jwt_secret: JWT_SECRET.into(),
        host: "127.0.0.1".into(),
        port: 0,
    }
}

pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), test_config());
    (state, store)
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub async fn register(state: &AppState, name: &str, email: &str, password: &str) -> User {
    auth_service::register(
        state,
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
        },
    )
    .await
    .unwrap()
}

pub async fn admin(state: &AppState, store: &MemoryStore) -> AuthUser {
    let user = register(state, "Admin", "admin@xtech.test", "admin-pass").await;
    assert!(store.set_admin(user.id, true).await);
    AuthUser {
        user_id: user.id,
        is_admin: true,
    }
}

pub async fn product(store: &dyn Store, name: &str, price: &str, category: Category) -> Product {
    store
        .insert_product(NewProduct {
            name: name.into(),
            price: dec(price),
            original_price: None,
            category,
            stock: 10,
            featured: false,
            is_new: false,
            image_url: None,
            description: None,
            rating: 0.0,
            sales: 0,
        })
        .await
        .unwrap()
}

pub fn customer(user: &User) -> AuthUser {
    AuthUser {
        user_id: user.id,
        is_admin: false,
    }
}

pub fn unknown_id() -> Uuid {
    Uuid::new_v4()
}
