pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

/// Storefront reads and customer submissions; no token required.
fn public_routes() -> Router<ApiState> {
    Router::new()
        .route("/api/v1/posts", get(handlers::list_published_posts))
        .route("/api/v1/posts/slug/{slug}", get(handlers::get_published_post))
        .route("/api/v1/posts/{id}/share", post(handlers::share_post))
        .route("/api/v1/categories", get(handlers::list_categories))
        .route(
            "/api/v1/categories/slug/{slug}",
            get(handlers::get_category_by_slug),
        )
        .route(
            "/api/v1/navigation/menus/type/{menu_type}",
            get(handlers::get_menu_by_type),
        )
        .route("/api/v1/navigation/breadcrumbs", get(handlers::get_breadcrumbs))
        .route("/api/v1/legal", get(handlers::list_legal_pages))
        .route(
            "/api/v1/legal/{page_type}/{jurisdiction}",
            get(handlers::get_legal_page_for),
        )
        .route("/api/v1/products", get(handlers::list_catalog))
        .route("/api/v1/products/slug/{slug}", get(handlers::get_product_by_slug))
        .route("/api/v1/products/compare", post(handlers::compare_products))
        .route("/api/v1/orders", post(handlers::submit_estimate))
        .route("/api/v1/seo/analyze", post(handlers::analyze_seo))
        .route("/api/v1/seo/keywords", post(handlers::suggest_keywords))
        .route("/api/v1/seo/meta", post(handlers::suggest_meta))
        .route("/api/v1/seo/organization", get(handlers::organization_schema))
}

/// Back-office routes; every request passes [`middleware::api_auth`].
fn admin_routes(state: ApiState) -> Router<ApiState> {
    Router::new()
        .route(
            "/api/v1/admin/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/api/v1/admin/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/api/v1/admin/posts/{id}/publish", post(handlers::publish_post))
        .route(
            "/api/v1/admin/posts/{id}/unpublish",
            post(handlers::unpublish_post),
        )
        .route("/api/v1/admin/posts/{id}/schedule", post(handlers::schedule_post))
        .route("/api/v1/admin/categories", post(handlers::create_category))
        .route(
            "/api/v1/admin/categories/{id}",
            patch(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/api/v1/admin/navigation/menus",
            get(handlers::list_menus).post(handlers::create_menu),
        )
        .route(
            "/api/v1/admin/navigation/menus/{id}",
            get(handlers::get_menu)
                .patch(handlers::update_menu)
                .delete(handlers::delete_menu),
        )
        .route(
            "/api/v1/admin/navigation/menus/{id}/validation",
            get(handlers::validate_menu),
        )
        .route("/api/v1/admin/legal", post(handlers::create_legal_page))
        .route(
            "/api/v1/admin/legal/generate",
            post(handlers::generate_legal_page),
        )
        .route(
            "/api/v1/admin/legal/{id}",
            get(handlers::get_legal_page)
                .patch(handlers::update_legal_page)
                .delete(handlers::delete_legal_page),
        )
        .route(
            "/api/v1/admin/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/api/v1/admin/products/{id}",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/api/v1/admin/orders", get(handlers::list_orders))
        .route("/api/v1/admin/orders/{id}", get(handlers::get_order))
        .route(
            "/api/v1/admin/orders/{id}/status",
            post(handlers::update_order_status),
        )
        .route("/api/v1/admin/ai/generate", post(handlers::generate_content))
        .route(
            "/api/v1/admin/ai/image-prompts",
            post(handlers::generate_image_prompts),
        )
        .route("/api/v1/admin/ai/seo-copy", post(handlers::generate_seo_copy))
        .route("/api/v1/admin/ai/requests", get(handlers::list_requests))
        .route("/api/v1/admin/ai/requests/{id}", get(handlers::get_request))
        .route("/api/v1/admin/ai/usage", get(handlers::usage_summary))
        .route(
            "/api/v1/admin/ai/templates",
            get(handlers::list_templates).post(handlers::create_template),
        )
        .route(
            "/api/v1/admin/ai/templates/{id}",
            patch(handlers::update_template).delete(handlers::delete_template),
        )
        .route(
            "/api/v1/admin/ai/settings",
            get(handlers::get_ai_settings).patch(handlers::update_ai_settings),
        )
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::api_auth,
        ))
}

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(admin_routes(state.clone()))
        .with_state(state)
}
