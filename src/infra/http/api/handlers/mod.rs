//! API handlers organized by resource type.
//!
//! Public handlers serve storefront reads and customer submissions; the rest
//! sit behind [`api_auth`](super::middleware::api_auth) and may read the
//! caller's [`ApiPrincipal`](super::middleware::ApiPrincipal).

mod ai;
mod categories;
mod legal;
mod navigation;
mod orders;
mod posts;
mod products;
mod seo;

pub use ai::*;
pub use categories::*;
pub use legal::*;
pub use navigation::*;
pub use orders::*;
pub use posts::*;
pub use products::*;
pub use seo::*;

use axum::Json;

use super::models::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
