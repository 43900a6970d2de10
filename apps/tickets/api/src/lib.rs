//! The tickets HTTP service: JSON dispatch over `/api/execute`, cookie sessions,
//! and the mail sending job.

pub mod api;
pub mod config;
pub mod state;

use axum::Router;
use axum_helpers::{create_router, health_router};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::state::AppState;

/// `/api/*` plus `/health`, with the shared middleware stack.
pub fn app(config: &Config, state: &AppState, cors: CorsLayer) -> Router {
    create_router(api::routes(state), &config.server, cors).merge(health_router(config.app.clone()))
}
