use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::DashboardStats,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderDetails, OrderStatus},
    routes::params::OrderListQuery,
    services::order_service::{load_orders, order_details},
    state::AppState,
    store::OrderFilter,
};

pub async fn dashboard_stats(state: &AppState, user: &AuthUser) -> AppResult<DashboardStats> {
    ensure_admin(user)?;
    let products = state.store.product_totals().await?;
    let orders = state.store.order_totals().await?;
    Ok(DashboardStats {
        total_products: products.count,
        total_orders: orders.count,
        total_sales: orders.sales,
        total_stock: products.stock,
    })
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: &OrderListQuery,
) -> AppResult<(Vec<OrderDetails>, u64)> {
    ensure_admin(user)?;
    let pagination = query.pagination();
    let filter = OrderFilter {
        user_id: None,
        status: query.status,
        limit: Some(pagination.per_page),
        offset: pagination.offset(),
    };
    load_orders(state, &filter, true).await
}

pub async fn get_order_admin(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderDetails> {
    ensure_admin(user)?;
    let order = state.store.find_order(id).await?.ok_or(AppError::NotFound)?;
    order_details(state, order, true).await
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: &str,
) -> AppResult<OrderDetails> {
    ensure_admin(user)?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e: crate::models::UnknownVariant| AppError::BadRequest(e.to_string()))?;

    let order = state
        .store
        .update_order_status(id, status)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(order_id = %id, status = %status, "order status updated");
    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": status.as_str() })),
    )
    .await;
    order_details(state, order, true).await
}
