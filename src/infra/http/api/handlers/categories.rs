use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::blog::{CreateCategoryCommand, UpdateCategoryCommand};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::CategoryListQuery;
use crate::infra::http::api::state::ApiState;

pub async fn list_categories(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let include_empty = query.include_empty.unwrap_or(false);
    Ok(Json(state.blog.get_categories(include_empty).await?))
}

pub async fn get_category_by_slug(
    State(state): State<ApiState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.get_category_by_slug(&slug).await?))
}

pub async fn create_category(
    State(state): State<ApiState>,
    ApiJson(command): ApiJson<CreateCategoryCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.blog.create_category(command).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateCategoryCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.update_category(id, command).await?))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.blog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
