use api_dispatch::ApiError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

use crate::errors::Envelope;

/// `Json<T>` whose rejection is a 400 envelope instead of axum's plain-text body.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Envelope;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Envelope::error(&ApiError::bad_request(rejection.body_text())))?;

        Ok(JsonBody(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Login {
        email: String,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_parses_body() {
        let JsonBody(login) = JsonBody::<Login>::from_request(request(r#"{"email":"a@b.c"}"#), &())
            .await
            .unwrap();
        assert_eq!(login.email, "a@b.c");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request_envelope() {
        let rejection = JsonBody::<Login>::from_request(request("{"), &())
            .await
            .err()
            .unwrap();

        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert!(!rejection.body().success);
        assert!(rejection.body().error_msg.is_some());
    }
}
