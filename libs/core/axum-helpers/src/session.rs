//! Stateless sessions: an HS256 JWT kept in an HTTP-only cookie.

use api_dispatch::{CallerIdentity, UserRole};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header::InvalidHeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use core_config::session::SessionConfig;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid cookie value: {0}")]
    Cookie(#[from] InvalidHeaderValue),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl From<SessionClaims> for CallerIdentity {
    fn from(claims: SessionClaims) -> Self {
        CallerIdentity {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and checks session tokens, and builds the cookies that carry them.
#[derive(Clone)]
pub struct SessionKeys {
    keys: Arc<Keys>,
    config: SessionConfig,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            config: config.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn issue(&self, identity: &CallerIdentity) -> SessionResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            exp: now + self.config.ttl.as_secs() as i64,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.encoding,
        )?)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> SessionResult<SessionClaims> {
        let data = decode::<SessionClaims>(
            token,
            &self.keys.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// The caller behind the session cookie in `headers`, if the token is valid.
    pub fn identity(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        let jar = CookieJar::from_headers(headers);
        let token = jar.get(self.cookie_name())?.value().to_string();

        match self.verify(&token) {
            Ok(claims) => Some(claims.into()),
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                None
            }
        }
    }

    /// `Set-Cookie` value for a freshly issued token.
    pub fn cookie(&self, token: &str) -> SessionResult<HeaderValue> {
        let cookie = self.build_cookie(token.to_string());
        Ok(HeaderValue::from_str(&format!(
            "{}; Max-Age={}",
            cookie,
            self.config.ttl.as_secs()
        ))?)
    }

    /// `Set-Cookie` value that makes the browser drop the session.
    pub fn clear_cookie(&self) -> SessionResult<HeaderValue> {
        let cookie = self.build_cookie(String::new());
        Ok(HeaderValue::from_str(&format!("{}; Max-Age=0", cookie))?)
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookies)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Resolves the session cookie and stores the [`CallerIdentity`] in the request
/// extensions. Requests without a valid session pass through anonymously.
pub async fn session_middleware(
    State(keys): State<SessionKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = keys.identity(request.headers()) {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use std::time::Duration;

    fn config(ttl_secs: u64) -> SessionConfig {
        SessionConfig {
            secret: "test-secret".into(),
            ttl: Duration::from_secs(ttl_secs),
            cookie_name: "tickets.sid".into(),
            secure_cookies: false,
        }
    }

    fn admin() -> CallerIdentity {
        CallerIdentity {
            id: "u-1".into(),
            email: "admin@example.com".into(),
            role: UserRole::Admin,
        }
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_issue_then_read_identity_from_cookie() {
        let keys = SessionKeys::new(&config(3600));
        let token = keys.issue(&admin()).unwrap();

        let headers = cookie_headers(&format!("theme=dark; tickets.sid={}", token));
        assert_eq!(keys.identity(&headers), Some(admin()));
    }

    #[test]
    fn test_claims_shape() {
        let keys = SessionKeys::new(&config(60));
        let claims = keys.verify(&keys.issue(&admin()).unwrap()).unwrap();

        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 60);
        assert_eq!(claims.jti.len(), 36);
    }

    #[test]
    fn test_foreign_signature_is_anonymous() {
        let other = SessionKeys::new(&SessionConfig {
            secret: "another-secret".into(),
            ..config(3600)
        });
        let token = other.issue(&admin()).unwrap();

        let keys = SessionKeys::new(&config(3600));
        assert!(keys.verify(&token).is_err());
        assert_eq!(keys.identity(&cookie_headers(&format!("tickets.sid={}", token))), None);
    }

    #[test]
    fn test_missing_cookie_is_anonymous() {
        let keys = SessionKeys::new(&config(3600));
        assert_eq!(keys.identity(&HeaderMap::new()), None);
        assert_eq!(keys.identity(&cookie_headers("tickets.sid=garbage")), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let keys = SessionKeys::new(&config(120));
        let set = keys.cookie("abc").unwrap();
        let set = set.to_str().unwrap();

        assert!(set.starts_with("tickets.sid=abc"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Path=/"));
        assert!(set.ends_with("Max-Age=120"));

        let cleared = keys.clear_cookie().unwrap();
        assert!(cleared.to_str().unwrap().ends_with("Max-Age=0"));
    }
}
