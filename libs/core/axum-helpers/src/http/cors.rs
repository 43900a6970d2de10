use axum::http::{HeaderValue, Method, header};
use core_config::{ConfigError, env_or_default};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS layer for the browser frontends.
///
/// Credentials are allowed so the session cookie travels with requests.
/// With an empty origin list the request origin is mirrored.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(allowed_origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// `CORS_ALLOWED_ORIGIN`: comma-separated origins, empty mirrors the caller.
pub fn cors_layer_from_env() -> Result<CorsLayer, ConfigError> {
    let origins = parse_origins(&env_or_default("CORS_ALLOWED_ORIGIN", ""))?;
    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGIN is empty, mirroring request origins");
    } else {
        tracing::info!(count = origins.len(), "CORS origins configured");
    }
    Ok(create_cors_layer(origins))
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>().map_err(|e| ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: e.to_string(),
            })
        })
        .collect()
}
