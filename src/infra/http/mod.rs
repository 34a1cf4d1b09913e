//! HTTP surface: the JSON API plus a liveness probe.

pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::RequestContext;

use axum::{Router, middleware as axum_middleware, routing::get};

/// Full application router with request ids and response logging applied.
pub fn build_router(state: ApiState) -> Router {
    build_api_router(state)
        .route("/health", get(api::handlers::health))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
