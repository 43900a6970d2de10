//! Readiness: MongoDB must answer a ping.

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use mongodb::Client;

async fn readiness_check(State(client): State<Client>) -> Response {
    let mongodb: HealthCheckFuture<'_> = Box::pin(async {
        let status = database::mongodb::check_health_detailed(&client).await;
        if status.healthy {
            Ok(())
        } else {
            Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("mongodb", mongodb)]).await
}

/// `GET /ready`
pub fn router(client: Client) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(client)
}
