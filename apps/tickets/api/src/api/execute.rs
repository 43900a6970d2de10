//! The generic dispatch endpoint and the name-suggestion shortcut.

use api_dispatch::{ApiError, ApiRequest, RequestSource, TransportHandle};
use axum::{extract::State, http::HeaderMap};
use axum_helpers::{Caller, ClientAddress, Envelope, JsonBody};
use serde_json::{Map, Value};

use crate::state::AppState;

const SUGGESTIONS_TARGET: &str = "core";
const FIO_SUGGESTIONS_ACTION: &str = "getFioSuggestions";

fn required_name(body: &Map<String, Value>, key: &str) -> Result<String, ApiError> {
    match body.get(key).and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ApiError::bad_request(format!(
            "Invalid request: '{}' must be a non-empty string",
            key
        ))),
    }
}

/// `POST /api/execute`: `{ target, action, ...params }`. The whole body is
/// handed to the action as its params.
pub async fn execute(
    State(state): State<AppState>,
    Caller(user): Caller,
    ClientAddress(remote_address): ClientAddress,
    headers: HeaderMap,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Envelope {
    let (target, action) = match (
        required_name(&body, "target"),
        required_name(&body, "action"),
    ) {
        (Ok(target), Ok(action)) => (target, action),
        (Err(e), _) | (_, Err(e)) => return e.into(),
    };

    let request = ApiRequest::new(RequestSource::Http, target, action, Value::Object(body))
        .with_user(user)
        .with_remote_address(remote_address)
        .with_transport(TransportHandle::new(headers));

    Envelope::from_result(state.dispatcher.execute(request).await)
}

/// `POST /api/suggestions/fio`: `core/getFioSuggestions` without the debug log line.
pub async fn fio_suggestions(
    State(state): State<AppState>,
    Caller(user): Caller,
    ClientAddress(remote_address): ClientAddress,
    headers: HeaderMap,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Envelope {
    let request = ApiRequest::new(
        RequestSource::Http,
        SUGGESTIONS_TARGET,
        FIO_SUGGESTIONS_ACTION,
        Value::Object(body),
    )
    .with_user(user)
    .with_remote_address(remote_address)
    .with_transport(TransportHandle::new(headers))
    .without_debug_log();

    Envelope::from_result(state.dispatcher.execute(request).await)
}
