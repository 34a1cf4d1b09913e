use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use super::error::ApiError;
use super::state::ApiState;

const USER_HEADER: &str = "x-user-id";
const DEFAULT_USER: &str = "admin";

/// Authenticated caller. Rate limits and the generation log key on `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPrincipal {
    pub user_id: String,
}

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers().get(header::AUTHORIZATION)) else {
        return ApiError::unauthorized().into_response();
    };

    if !token_accepted(&state.admin_tokens, token) {
        return ApiError::unauthorized().into_response();
    }

    let principal = ApiPrincipal {
        user_id: user_id(request.headers()),
    };
    request.extensions_mut().insert(principal.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// Any non-empty token passes when no tokens are configured.
fn token_accepted(accepted: &[String], presented: &str) -> bool {
    if accepted.is_empty() {
        return true;
    }
    accepted
        .iter()
        .fold(false, |matched, candidate| {
            matched | bool::from(candidate.as_bytes().ct_eq(presented.as_bytes()))
        })
}

fn extract_token(header: Option<&HeaderValue>) -> Option<&str> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then_some(bearer)
}

fn user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        let value = HeaderValue::from_static("Bearer abc123");
        assert_eq!(extract_token(Some(&value)), Some("abc123"));

        let value = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_token(Some(&value)), None);

        let value = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_token(Some(&value)), None);
        assert_eq!(extract_token(None), None);
    }

    #[test]
    fn configured_tokens_must_match() {
        let tokens = vec!["alpha".to_string(), "beta".to_string()];
        assert!(token_accepted(&tokens, "beta"));
        assert!(!token_accepted(&tokens, "gamma"));
        assert!(!token_accepted(&tokens, "alph"));
        assert!(token_accepted(&[], "anything"));
    }

    #[test]
    fn user_defaults_to_admin() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), "admin");
        headers.insert(USER_HEADER, HeaderValue::from_static("editor-7"));
        assert_eq!(user_id(&headers), "editor-7");
    }
}
