use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{orders::OrderList, users::UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{auth_service, order_service},
    state::AppState,
    store::UserPatch,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).patch(update_profile))
        .route("/orders", get(my_orders))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let profile = auth_service::get_user_by_id(&state, user.user_id)
        .await
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("OK", profile, Some(Meta::empty()))))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 500, description = "Profile update failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if payload.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
        return Err(AppError::BadRequest("email must not be empty".into()));
    }
    let updated = auth_service::update_profile(&state, user.user_id, UserPatch::from(payload)).await?;
    Ok(Json(ApiResponse::success(
        "Profile updated",
        updated,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/profile/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders placed by the current user", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let pagination = query.pagination();
    let (items, total) = order_service::list_user_orders(&state, user.user_id, pagination).await?;
    Ok(Json(ApiResponse::success(
        "OK",
        OrderList { items },
        Some(Meta::new(pagination.page, pagination.per_page, total)),
    )))
}
