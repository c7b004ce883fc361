//! Routing module for the commerce engine.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatch::SharedDispatcher;

/// Creates and configures the application router with all routes and
/// middleware.
pub fn create_app_router(dispatcher: SharedDispatcher) -> Router {
    // Permissive CORS for local development.
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(crate::mcp::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(dispatcher)
}
