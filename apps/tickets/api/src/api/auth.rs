//! Login, session check and logout.

use api_dispatch::{ActionResult, ApiError, ErrorKind};
use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use axum_helpers::{Caller, Envelope, JsonBody};
use domain_users::User;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, info};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

/// `{ success, user, uiSettings }`
fn session_body(user: &User) -> ActionResult {
    let mut body = ActionResult::ok();
    body.fields.insert("user".to_string(), json!(user.info()));
    body.fields
        .insert("uiSettings".to_string(), Value::Object(Map::new()));
    body
}

fn internal(message: &str, err: impl std::fmt::Display) -> Response {
    error!(error = %err, "{}", message);
    Envelope::from(ApiError::internal(message)).into_response()
}

/// `POST /api/login`: checks credentials and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(params): JsonBody<LoginParams>,
) -> Response {
    let email = params.email.trim().to_lowercase();
    let user = match state.users.find_by_credentials(&email, &params.password).await {
        Ok(user) => user,
        Err(e) => return Envelope::from(ApiError::from(e)).into_response(),
    };

    let cookie = match state
        .sessions
        .issue(&user.identity())
        .and_then(|token| state.sessions.cookie(&token))
    {
        Ok(cookie) => cookie,
        Err(e) => return internal("Failed to open a session", e),
    };

    info!(user_id = %user.id, "User logged in");
    ([(SET_COOKIE, cookie)], Envelope::ok(session_body(&user))).into_response()
}

/// `POST /api/check_auth`: the current user, or 401.
pub async fn check_auth(State(state): State<AppState>, Caller(caller): Caller) -> Envelope {
    let Some(caller) = caller else {
        return ApiError::unauthorized("Authentication required").into();
    };

    match state.users.get_user(&caller.id).await {
        Ok(user) if user.active => Envelope::ok(session_body(&user)),
        Ok(_) => ApiError::unauthorized("Account is deactivated").into(),
        Err(e) => {
            let err = ApiError::from(e);
            match err.kind() {
                ErrorKind::NotFound => {
                    ApiError::unauthorized("Authentication required").into()
                }
                _ => err.into(),
            }
        }
    }
}

/// `GET /api/logout`: drops the session cookie.
pub async fn logout(State(state): State<AppState>) -> Response {
    match state.sessions.clear_cookie() {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Envelope::ok(ActionResult::ok())).into_response(),
        Err(e) => internal("Failed to close the session", e),
    }
}
