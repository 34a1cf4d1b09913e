//! Blog post handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::blog::{CreatePostCommand, PostQuery, UpdatePostCommand};
use crate::domain::types::PostStatus;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::middleware::ApiPrincipal;
use crate::infra::http::api::models::{ScheduleRequest, ShareRequest};
use crate::infra::http::api::state::ApiState;

/// Storefront listing; only published posts are visible.
pub async fn list_published_posts(
    State(state): State<ApiState>,
    ApiQuery(mut query): ApiQuery<PostQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.status = Some(PostStatus::Published);
    Ok(Json(state.blog.list_posts(&query).await?))
}

pub async fn get_published_post(
    State(state): State<ApiState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.get_published_post(&slug).await?))
}

pub async fn share_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.blog.record_social_share(id, payload.platform).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_posts(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<PostQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.list_posts(&query).await?))
}

pub async fn get_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.get_post_by_id(id, false).await?))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    ApiJson(command): ApiJson<CreatePostCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.blog.create_post(command, &principal.user_id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdatePostCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.update_post(id, command).await?))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.blog.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.publish_post(id).await?))
}

pub async fn unpublish_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.unpublish_post(id).await?))
}

pub async fn schedule_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.blog.schedule_post(id, payload.scheduled_for).await?))
}
