use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::catalog::{ProductDraft, ProductQuery, UpdateProductCommand};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::CompareRequest;
use crate::infra::http::api::state::ApiState;

/// Storefront listing; deactivated products stay hidden.
pub async fn list_catalog(
    State(state): State<ApiState>,
    ApiQuery(mut query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.include_inactive = false;
    Ok(Json(state.products.list_products(&query).await?))
}

pub async fn get_product_by_slug(
    State(state): State<ApiState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.products.get_product_by_slug(&slug).await?))
}

pub async fn compare_products(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CompareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.products.compare_products(&payload.product_ids).await?))
}

pub async fn list_products(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.products.list_products(&query).await?))
}

pub async fn get_product(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.products.get_product(id).await?))
}

pub async fn create_product(
    State(state): State<ApiState>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.products.create_product(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateProductCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.products.update_product(id, command).await?))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
