use super::shutdown::ShutdownCoordinator;
use crate::errors::not_found;
use crate::http::security::security_headers;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Nests `apis` under `/api` and wraps everything in the common layers:
/// tracing, security headers, CORS, body limit, request timeout, compression.
/// Unmatched routes get the 404 envelope.
pub fn create_router(apis: Router, server_config: &ServerConfig, cors: CorsLayer) -> Router {
    Router::new()
        .nest("/api", apis)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(server_config.body_limit_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(server_config.request_timeout))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
}

/// Serves `router` until SIGINT/SIGTERM, then runs `cleanup` bounded by
/// `shutdown_timeout`.
///
/// Peer addresses are exposed to handlers through `ConnectInfo<SocketAddr>`.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let signal_handle = coordinator.clone();
    let mut cleanup_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    tokio::spawn(async move { signal_handle.wait_for_signal().await });

    let cleanup_handle = tokio::spawn(async move {
        let _ = cleanup_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(()) => info!("Cleanup completed successfully"),
            Err(_) => tracing::warn!(
                "Cleanup exceeded timeout of {:?}, forcing shutdown",
                shutdown_timeout
            ),
        }
    });

    let mut serve_rx = coordinator.subscribe();
    let serve_result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = serve_rx.recv().await;
    })
    .await
    .inspect_err(|e| tracing::error!("Server encountered an error: {:?}", e));

    // The server may also stop on its own error; cleanup still has to run.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
