//! Navigation handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::navigation::{CreateMenuCommand, UpdateMenuCommand, validate_navigation_menu};
use crate::domain::types::MenuType;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::infra::http::api::models::BreadcrumbQuery;
use crate::infra::http::api::state::ApiState;

pub async fn get_menu_by_type(
    State(state): State<ApiState>,
    ApiPath(menu_type): ApiPath<MenuType>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.navigation.get_menu_by_type(menu_type).await?))
}

pub async fn get_breadcrumbs(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<BreadcrumbQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.navigation.get_breadcrumbs(&query.path).await?))
}

pub async fn list_menus(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.navigation.list_menus().await?))
}

pub async fn get_menu(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.navigation.get_menu(id).await?))
}

pub async fn validate_menu(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state.navigation.get_menu(id).await?;
    Ok(Json(validate_navigation_menu(&menu)))
}

pub async fn create_menu(
    State(state): State<ApiState>,
    ApiJson(command): ApiJson<CreateMenuCommand>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state.navigation.create_menu(command).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(command): ApiJson<UpdateMenuCommand>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.navigation.update_menu(id, command).await?))
}

pub async fn delete_menu(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.navigation.delete_menu(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
