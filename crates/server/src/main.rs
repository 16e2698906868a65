mod bootstrap;
mod handlers;
mod startup;

use anyhow::Result;
use quartermaster_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use quartermaster_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    startup::announce_version_change(
        &app.api,
        &app.markers,
        app.config.channels.update.as_deref(),
        &app.config.storage.changelog_path,
        env!("CARGO_PKG_VERSION"),
    )
    .await?;
    startup::ensure_role_picker(
        &app.publisher,
        &app.markers,
        app.config.channels.role_picker.as_deref(),
    )
    .await?;

    app.gateway.start().await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "quartermaster-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "quartermaster-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
