//! API routes for the busline server.

pub mod auth;
pub mod error;
pub mod location_validation;
pub mod request_id;
mod routes;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

pub fn routes(config: &Config) -> Router<Arc<AppState>> {
    routes::create_router(config)
}

/// Fully layered application, ready to serve.
pub fn app(state: Arc<AppState>) -> Router {
    routes(state.config())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(CorsLayer::permissive())
}
