use axum_helpers::{cors_layer_from_env, create_production_app};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::SmtpTransport;
use domain_suggestions::DaDataClient;
use std::sync::Arc;
use std::time::Duration;
use tickets_api::api;
use tickets_api::config::Config;
use tickets_api::state::{AppState, Integrations, Repositories};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());
    info!("Connected to MongoDB database: {}", config.mongodb.database());

    if !config.suggestions.is_configured() {
        warn!("DADATA_API_KEY is not set, name suggestions will come from the cache only");
    }

    let repositories = Repositories::mongo(&db).await?;
    let integrations = Integrations {
        mail_transport: Arc::new(SmtpTransport::new(&config.mail.smtp)?),
        suggestion_provider: Arc::new(DaDataClient::new(config.suggestions.clone())?),
    };
    let (state, mailer) = AppState::build(&config, repositories, integrations)?;

    let verifier = mailer.clone();
    tokio::spawn(async move {
        verifier.verify_transport().await;
    });

    let sending_job = Arc::new(mailer.sending_job());
    sending_job.start();

    let app = tickets_api::app(&config, &state, cors_layer_from_env()?)
        .merge(api::health::router(mongo_client.clone()));

    info!("Starting tickets API (30s shutdown timeout)");
    let job = sending_job.clone();
    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: stopping the mail sending job");
        job.stop().await;
        drop(mongo_client);
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Tickets API shutdown complete");
    Ok(())
}
