//! Repository migrator HTTP service
//!
//! # Environment Variables
//!
//! - `MIGRATOR_SECRET`: Shared secret required on trigger endpoints (required)
//! - `GITHUB_APP_ID` and `GITHUB_APP_PRIVATE_KEY`: GitHub App credentials
//! - `GITHUB_TOKEN`: Token used when no GitHub App is configured
//! - `WEBHOOK_SECRET`: Key of the release webhook signature
//! - `MIGRATION_CONFIG`: Path of a TOML or JSON migration settings file
//! - `DEFAULT_OWNER`: Owner assumed for bare repository names
//! - `API_PORT`: Port to listen on (default: 8080)
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `LOG_FORMAT`: `text` (default) or `json`
//! - `RUST_LOG`: Log level (default: info)

use config_manager::MigrationSettings;
use repo_migrator_api::{ApiConfig, ApiServer, AppState, LogFormat, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let settings = match &config.migration_config {
        Some(path) => {
            tracing::info!("Loading migration settings from {}", path.display());
            MigrationSettings::load(path)?
        }
        None => MigrationSettings::default(),
    };

    let state = AppState::from_config(&config, settings)?;
    let server = ApiServer::new(ApiConfig::from(&config), state);

    tracing::info!("Starting repository migrator");
    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set; release webhooks will be rejected");
    }

    server.serve().await
}
