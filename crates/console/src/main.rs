//! `polyadmin-console` -- headless administration console for a polystore
//! DBMS.
//!
//! Connects to the backend's HTTP API and live channel, keeps the adapter
//! listings current and mirrors every notification into the log.
//!
//! See [`ConsoleConfig::from_env`] for the environment variables.

use polyadmin_console::{Console, ConsoleConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polyadmin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConsoleConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        http_url = %config.http_url,
        ws_url = %config.ws_url,
        "Starting polyadmin-console",
    );

    let console = Console::start(config).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to start console");
        std::process::exit(1);
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    console.shutdown().await;
}
