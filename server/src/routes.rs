use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::app_state::AppState;
use crate::{export, plotgen};

/// Build the main application router
pub fn app_router() -> Router<AppState> {
    Router::new()
        // Root route
        .route("/", get(root))
        // Health check
        .route("/health", get(health_check))
        // Archive export; non-GET methods get the 405 + Allow contract
        .route(
            "/weather.csv",
            get(export::export_csv).fallback(export::method_not_allowed),
        )
        // Generated plot documents for the report UI
        .route("/plots/{name}", get(plotgen::serve_plot))
        // Fallback handler for 404
        .fallback(handler_404)
        // The report UI is served from another origin during development
        .layer(CorsLayer::very_permissive())
}

// Handler for root
async fn root() -> &'static str {
    "Server is running!"
}

// Handler for health check
async fn health_check() -> &'static str {
    "OK"
}

// Handler for 404 Not Found
async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}
