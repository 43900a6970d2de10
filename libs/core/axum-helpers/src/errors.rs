//! Envelope responses.
//!
//! Every response the API produces, successful or not, has the
//! `{ success, errorMsg?, cid?, ...fields }` shape. The HTTP status is taken
//! from the error kind.

use api_dispatch::{ActionResult, ApiError, ApiResult};
use axum::{
    Json,
    extract::OriginalUri,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

/// An [`ActionResult`] paired with the status it is sent with.
#[derive(Debug, Clone)]
pub struct Envelope {
    status: StatusCode,
    body: ActionResult,
}

impl Envelope {
    pub fn ok(body: ActionResult) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn error(err: &ApiError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(cid = err.cid().unwrap_or("-"), status = status.as_u16(), "{}", err);
        }
        Self {
            status,
            body: ActionResult::failure(err),
        }
    }

    pub fn from_result(result: ApiResult<ActionResult>) -> Self {
        match result {
            Ok(body) => Self::ok(body),
            Err(err) => Self::error(&err),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ActionResult {
        &self.body
    }
}

impl From<ApiError> for Envelope {
    fn from(err: ApiError) -> Self {
        Self::error(&err)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Fallback handler: `Cannot <METHOD> '<path>'` with a 404 envelope.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> Envelope {
    Envelope::error(&ApiError::not_found(format!(
        "Cannot {} '{}'",
        method,
        uri.path()
    )))
}
