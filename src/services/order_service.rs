use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    models::{CustomerSummary, Order, OrderDetails, OrderWithItems},
    routes::params::Pagination,
    state::AppState,
    store::{OrderDraft, OrderFilter, OrderLineDraft, StoreError},
};

const ORDER_NUMBER_ATTEMPTS: u32 = 3;

pub fn order_number_at(at: DateTime<Utc>) -> String {
    format!("ORD-{}", at.timestamp_millis())
}

/// Turn the user's cart into a pending order and empty the cart.
///
/// Prices are read from the products at checkout time and frozen into the lines.
pub async fn create_order_from_cart(
    state: &AppState,
    user_id: Uuid,
    shipping_address: &str,
) -> AppResult<OrderWithItems> {
    let shipping_address = shipping_address.trim();
    if shipping_address.is_empty() {
        return Err(AppError::BadRequest("shipping address is required".into()));
    }

    let lines = state.store.cart_lines(user_id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let drafts: Vec<OrderLineDraft> = lines
        .iter()
        .map(|line| OrderLineDraft {
            cart_item_id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.product.price,
            total_price: line.line_total(),
        })
        .collect();
    let total_amount: Decimal = drafts.iter().map(|d| d.total_price).sum();

    let mut draft = OrderDraft {
        user_id,
        order_number: String::new(),
        total_amount,
        shipping_address: shipping_address.to_string(),
        lines: drafts,
    };

    // Order numbers are unique; two checkouts in the same millisecond take the next one.
    let mut at = Utc::now();
    let mut attempt = 1;
    let placed = loop {
        draft.order_number = order_number_at(at);
        match state.store.place_order(draft.clone()).await {
            Ok(placed) => break placed,
            Err(StoreError::Stale(detail)) => {
                tracing::info!(%user_id, %detail, "cart changed during checkout");
                return Err(AppError::CartChanged);
            }
            Err(StoreError::Conflict(detail)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                tracing::debug!(%detail, attempt, "order number taken, retrying");
                at += Duration::milliseconds(1);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };

    tracing::info!(
        order_id = %placed.order.id,
        order_number = %placed.order.order_number,
        total = %placed.order.total_amount,
        "order placed"
    );
    log_audit(
        state.store.as_ref(),
        Some(user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": placed.order.id })),
    )
    .await;
    Ok(placed)
}

pub async fn list_user_orders(
    state: &AppState,
    user_id: Uuid,
    pagination: Pagination,
) -> AppResult<(Vec<OrderDetails>, u64)> {
    let filter = OrderFilter {
        user_id: Some(user_id),
        status: None,
        limit: Some(pagination.per_page),
        offset: pagination.offset(),
    };
    load_orders(state, &filter, false).await
}

/// Fetch one of the user's own orders. Other users' orders read as missing.
pub async fn get_order(state: &AppState, user_id: Uuid, order_id: Uuid) -> AppResult<OrderDetails> {
    let order = state
        .store
        .find_order(order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or(AppError::NotFound)?;
    order_details(state, order, false).await
}

pub(crate) async fn load_orders(
    state: &AppState,
    filter: &OrderFilter,
    with_customer: bool,
) -> AppResult<(Vec<OrderDetails>, u64)> {
    let (orders, total) = state.store.list_orders(filter).await?;
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(order_details(state, order, with_customer).await?);
    }
    Ok((details, total))
}

pub(crate) async fn order_details(
    state: &AppState,
    order: Order,
    with_customer: bool,
) -> AppResult<OrderDetails> {
    let items = state.store.order_lines(order.id).await?;
    let customer = if with_customer {
        state
            .store
            .find_user_by_id(order.user_id)
            .await?
            .map(|u| CustomerSummary {
                name: u.name,
                email: u.email,
            })
    } else {
        None
    };
    Ok(OrderDetails {
        order,
        customer,
        items,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(order_number_at(at), "ORD-1700000000123");
    }
}
