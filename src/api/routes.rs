use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower::ServiceBuilder;
use axum::extract::DefaultBodyLimit;

use super::handlers::*;
use super::state::SharedState;

const DEFAULT_BODY_LIMIT: usize = 100 * 1024 * 1024;

pub fn create_router(state: SharedState) -> Router {
    create_router_with(state, DEFAULT_BODY_LIMIT, None)
}

/// Router with a custom body limit and, optionally, the front-end served for unmatched paths
pub fn create_router_with(
    state: SharedState,
    body_limit: usize,
    static_dir: Option<&Path>,
) -> Router {
    let router = Router::new()
        .route("/downloadBbox", post(download_bbox))
        .route("/getPolygon", post(get_polygon))
        .route("/health", get(health))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(CorsLayer::permissive()),
    )
}
