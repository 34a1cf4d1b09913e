//! Deterministic SEO helpers exposed for editors and the storefront.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::application::seo::{
    MAX_KEYWORDS, generate_keywords, generate_meta_description, generate_meta_title,
    generate_organization_structured_data, validate_seo_quality,
};
use crate::domain::seo::SeoData;

use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiJson;
use crate::infra::http::api::models::{KeywordsRequest, KeywordsResponse, MetaRequest, MetaResponse};
use crate::infra::http::api::state::ApiState;

pub async fn analyze_seo(ApiJson(seo): ApiJson<SeoData>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(validate_seo_quality(&seo)))
}

pub async fn suggest_keywords(
    ApiJson(payload): ApiJson<KeywordsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty", None));
    }
    let mut keywords = generate_keywords(&payload.text, &payload.seed);
    keywords.truncate(MAX_KEYWORDS);
    Ok(Json(KeywordsResponse { keywords }))
}

pub async fn suggest_meta(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<MetaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty", None));
    }
    let site_name = state.blog.site().name.clone();
    Ok(Json(MetaResponse {
        meta_title: generate_meta_title(&payload.title, Some(&site_name)),
        meta_description: payload
            .content
            .as_deref()
            .filter(|content| !content.trim().is_empty())
            .map(generate_meta_description),
    }))
}

pub async fn organization_schema(State(state): State<ApiState>) -> impl IntoResponse {
    Json(generate_organization_structured_data(state.blog.site()))
}
