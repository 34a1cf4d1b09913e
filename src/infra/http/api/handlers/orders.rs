use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::orders::EstimateRequest;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::{OrderListQuery, OrderStatusRequest};
use crate::infra::http::api::state::ApiState;

/// Customer-facing; no token required.
pub async fn submit_estimate(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<EstimateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.create_estimate(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orders.list_orders(query.status).await?))
}

pub async fn get_order(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orders.get_order(id).await?))
}

pub async fn update_order_status(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<OrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.orders.update_order_status(id, payload.status).await?))
}
