//! HTTP routes, nested under `/api` by `axum_helpers::create_router`.

pub mod auth;
pub mod execute;
pub mod health;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_helpers::session_middleware;

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router {
    Router::new()
        .route("/execute", post(execute::execute))
        .route("/suggestions/fio", post(execute::fio_suggestions))
        .route(
            "/suggestions/api/4_1/rs/suggest/fio",
            post(execute::fio_suggestions),
        )
        .route("/login", post(auth::login))
        .route("/check_auth", post(auth::check_auth))
        .route("/logout", get(auth::logout))
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .with_state(state.clone())
}
