//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing, `Cache-Control: no-store` on API responses.

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Vault items
        .route(
            "/items",
            get(handlers::vault::list_items).post(handlers::vault::create_item),
        )
        .route(
            "/items/{id}",
            get(handlers::vault::get_item)
                .put(handlers::vault::update_item)
                .delete(handlers::vault::delete_item),
        )
        .route(
            "/items/{id}/reveal",
            post(handlers::vault::reveal_password),
        )
        // Generator and cipher self-test
        .route("/generate", get(handlers::generator::generate_password))
        .route("/selftest", post(handlers::generator::self_test))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
