use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    routes::params::ProductQuery,
    state::AppState,
    store::{NewProduct, ProductFilter, ProductPatch},
};

pub async fn list_products(state: &AppState, query: &ProductQuery) -> AppResult<(Vec<Product>, u64)> {
    let pagination = query.pagination();
    let filter = ProductFilter {
        search: query.q.clone().filter(|s| !s.trim().is_empty()),
        category: query.category,
        featured: query.featured,
        limit: Some(pagination.per_page),
        offset: pagination.offset(),
    };
    Ok(state.store.list_products(&filter).await?)
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    state.store.find_product(id).await?.ok_or(AppError::NotFound)
}

fn validate_price(price: rust_decimal::Decimal) -> AppResult<()> {
    if price <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("price must be greater than 0".into()));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> AppResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::BadRequest("rating must be between 0 and 5".into()));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_price(payload.price)?;
    validate_stock(payload.stock)?;

    let mut new_product = NewProduct::from(payload);
    new_product.name = new_product.name.trim().to_string();
    let product = state.store.insert_product(new_product).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    ensure_admin(user)?;
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let product = state
        .store
        .update_product(id, ProductPatch::from(payload))
        .await?
        .ok_or(AppError::NotFound)?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;
    Ok(product)
}

pub async fn delete_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;
    if !state.store.delete_product(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(product_id = %id, "product deleted");
    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;
    Ok(())
}
