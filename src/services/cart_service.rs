use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    models::{CartItem, CartLine},
    state::AppState,
    store::StoreError,
};

/// Upper bound for a single cart line's quantity.
pub const MAX_CART_QUANTITY: i32 = 999;

fn quantity_too_large() -> AppError {
    AppError::BadRequest(format!("quantity must not exceed {MAX_CART_QUANTITY}"))
}

pub async fn get_cart_items(state: &AppState, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    Ok(state.store.cart_lines(user_id).await?)
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Add `quantity` of a product, merging into the existing row for the pair.
pub async fn add_to_cart(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<CartItem> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(quantity_too_large());
    }
    if state.store.find_product(product_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let existing = state
        .store
        .cart_lines(user_id)
        .await?
        .into_iter()
        .find(|line| line.product_id == product_id)
        .map_or(0, |line| line.quantity);
    if existing.saturating_add(quantity) > MAX_CART_QUANTITY {
        return Err(quantity_too_large());
    }

    let item = match state
        .store
        .add_cart_quantity(user_id, product_id, quantity)
        .await
    {
        Ok(item) => item,
        Err(StoreError::OutOfRange(detail)) => {
            tracing::debug!(%user_id, %product_id, %detail, "cart merge rejected");
            return Err(quantity_too_large());
        }
        Err(err) => return Err(err.into()),
    };
    tracing::debug!(%user_id, %product_id, quantity = item.quantity, "cart line merged");

    log_audit(
        state.store.as_ref(),
        Some(user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id, "quantity": quantity })),
    )
    .await;
    Ok(item)
}

/// Overwrite a line's quantity. Zero or less removes the line.
/// Above [`MAX_CART_QUANTITY`] is rejected.
pub async fn update_cart_quantity(
    state: &AppState,
    user_id: Uuid,
    cart_item_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return remove_from_cart(state, user_id, cart_item_id).await;
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(quantity_too_large());
    }
    let updated = state
        .store
        .set_cart_quantity(user_id, cart_item_id, quantity)
        .await?;
    if updated.is_none() {
        tracing::debug!(%user_id, %cart_item_id, "quantity update for absent cart line");
    }
    Ok(())
}

pub async fn remove_from_cart(state: &AppState, user_id: Uuid, cart_item_id: Uuid) -> AppResult<()> {
    let removed = state.store.delete_cart_item(user_id, cart_item_id).await?;
    if removed > 0 {
        log_audit(
            state.store.as_ref(),
            Some(user_id),
            "cart_remove",
            Some("cart_items"),
            Some(serde_json::json!({ "cart_item_id": cart_item_id })),
        )
        .await;
    }
    Ok(())
}

pub async fn clear_cart(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let removed = state.store.clear_cart(user_id).await?;
    tracing::debug!(%user_id, removed, "cart cleared");
    Ok(())
}
