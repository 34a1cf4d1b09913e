//! Content generation, request log, templates and settings.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::ai::{
    CreateTemplateCommand, GenerateContentCommand, UpdateAiSettingsCommand, UpdateTemplateCommand,
};

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::middleware::ApiPrincipal;
use crate::infra::http::api::models::{
    ImagePromptsRequest, ImagePromptsResponse, RequestListQuery, SeoCopyRequest, UsageQuery,
};
use crate::infra::http::api::state::ApiState;

const DEFAULT_REQUEST_PAGE: usize = 20;

pub async fn generate_content(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    ApiJson(command): ApiJson<GenerateContentCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .ai
        .generate_content(command, &principal.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn generate_image_prompts(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    ApiJson(payload): ApiJson<ImagePromptsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prompts = state
        .ai
        .generate_image_prompts(&payload.description, payload.count, &principal.user_id)
        .await?;
    Ok(Json(ImagePromptsResponse { prompts }))
}

pub async fn generate_seo_copy(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    ApiJson(payload): ApiJson<SeoCopyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let copy = state
        .ai
        .generate_seo_copy(
            &payload.subject,
            payload.context.as_deref(),
            &principal.user_id,
        )
        .await?;
    Ok(Json(copy))
}

pub async fn list_requests(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<RequestListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .ai
        .list_requests(
            query.user_id.as_deref(),
            query.limit.unwrap_or(DEFAULT_REQUEST_PAGE),
        )
        .await?;
    Ok(Json(requests))
}

pub async fn get_request(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ai.get_request(id).await?))
}

pub async fn usage_summary(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<UsageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ai.usage_summary(query.user_id.as_deref()).await?))
}

pub async fn list_templates(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.templates.list().await?))
}

pub async fn create_template(
    State(state): State<ApiState>,
    ApiJson(command): ApiJson<CreateTemplateCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state.templates.create(command).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateTemplateCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.templates.update(id, command).await?))
}

pub async fn delete_template(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.templates.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_ai_settings(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ai_settings.get().await?))
}

pub async fn update_ai_settings(
    State(state): State<ApiState>,
    ApiJson(command): ApiJson<UpdateAiSettingsCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ai_settings.update(command).await?))
}
