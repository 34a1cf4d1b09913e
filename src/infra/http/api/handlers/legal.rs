use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::legal::{
    CreateLegalPageCommand, GenerateLegalPageCommand, UpdateLegalPageCommand,
};
use crate::domain::types::LegalPageType;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::middleware::ApiPrincipal;
use crate::infra::http::api::models::LegalListQuery;
use crate::infra::http::api::state::ApiState;

pub async fn list_legal_pages(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<LegalListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .legal
            .list_pages(query.jurisdiction.as_deref())
            .await?,
    ))
}

pub async fn get_legal_page_for(
    State(state): State<ApiState>,
    ApiPath((page_type, jurisdiction)): ApiPath<(LegalPageType, String)>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.legal.get_page_for(page_type, &jurisdiction).await?))
}

pub async fn get_legal_page(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.legal.get_page(id).await?))
}

pub async fn create_legal_page(
    State(state): State<ApiState>,
    ApiJson(command): ApiJson<CreateLegalPageCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.legal.create_page(command).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update_legal_page(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateLegalPageCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.legal.update_page(id, command).await?))
}

pub async fn delete_legal_page(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.legal.delete_page(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate_legal_page(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    ApiJson(command): ApiJson<GenerateLegalPageCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .legal
        .generate_page(command, &principal.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(page)))
}
