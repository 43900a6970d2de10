//! # Axum Helpers
//!
//! HTTP plumbing shared by the tickets binaries.
//!
//! - **[`errors`]**: the `{ success, errorMsg?, cid? }` envelope as an axum response
//! - **[`session`]**: HS256 session tokens in an HTTP-only cookie
//! - **[`extractors`]**: envelope-rejecting JSON body, caller identity, client address
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly, health, graceful shutdown
//!
//! ```ignore
//! use axum_helpers::{SessionKeys, create_production_app, create_router, cors_layer_from_env};
//!
//! let keys = SessionKeys::new(&config.session);
//! let router = create_router(api_routes, &config.server, cors_layer_from_env()?);
//! create_production_app(router, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;
pub mod session;

pub use errors::{Envelope, not_found};
pub use extractors::{Caller, ClientAddress, JsonBody};
pub use http::{cors_layer_from_env, create_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
pub use session::{SessionClaims, SessionError, SessionKeys, SessionResult, session_middleware};
