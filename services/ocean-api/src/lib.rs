//! LLC4320 ocean data API.
//!
//! JSON endpoints under `/api` backed by [`ocean_grid::DataService`], plus
//! the static frontend served from a directory at `/`.

pub mod config;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{handler::HandlerWithoutStateExt, routing::get, Extension, Router};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::state::AppState;

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let frontend = ServeDir::new(&state.frontend_dir)
        .not_found_service(handlers::error::not_found_handler.into_service());

    Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .route("/api/metadata", get(handlers::metadata::metadata_handler))
        .route("/api/data/slice", get(handlers::data::slice_handler))
        .route("/api/data/timestep", get(handlers::data::timestep_handler))
        .route(
            "/api/coordinates",
            get(handlers::coordinates::coordinates_handler),
        )
        .fallback_service(frontend)
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
