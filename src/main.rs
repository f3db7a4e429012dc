//! chatterd - a line-oriented chat daemon.

use chatterd::auth::CredentialStore;
use chatterd::commands::Registry;
use chatterd::config::Config;
use chatterd::network::Gateway;
use chatterd::state::Roster;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    // A missing or malformed credentials file means the server must not
    // start.
    let creds = CredentialStore::load(&config.auth.passwd_path).map_err(|e| {
        error!(path = %config.auth.passwd_path, error = %e, "Failed to load credentials");
        e
    })?;

    info!(
        server = %config.server.name,
        listen = %config.server.listen,
        "Starting chatterd"
    );

    let roster = Arc::new(Roster::new());
    let registry = Arc::new(Registry::new());

    let gateway = Gateway::bind(
        config.server.listen,
        roster,
        registry,
        Arc::new(creds),
        Duration::from_secs(config.auth.timeout_secs),
    )
    .await?;

    gateway.run().await?;

    Ok(())
}
