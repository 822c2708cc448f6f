mod bootstrap;
mod channels;
mod google;
mod health;
mod sendgrid;
mod sweeper;
mod twilio;
mod twiml;
mod voice;

use std::time::Duration;

use anyhow::Result;
use stayline_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use stayline_core::config::LogFormat::*;
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
    // Logging needs the loaded config, so it comes up before bootstrap.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let sweeper = sweeper::spawn(
        app.dialogue.clone(),
        Duration::from_secs(app.config.dialogue.sweep_interval_secs),
    );

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        business_name = %app.config.dialogue.business_name,
        "stayline-server listening for voice webhooks"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let serve = axum::serve(listener, app.router()).with_graceful_shutdown(async move {
        if let Err(error) = wait_for_shutdown().await {
            tracing::error!(
                event_name = "system.server.signal_error",
                correlation_id = "shutdown",
                error = %error,
                "failed to listen for shutdown signal"
            );
        }
        let _ = signalled_tx.send(());
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        joined = &mut server => joined??,
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight webhooks did not finish before the grace period"
            );
            server.abort();
        }
    }

    sweeper.abort();
    if tokio::time::timeout(grace, app.dialogue.drain_notifications()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.notifications_abandoned",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "guest notifications still pending at shutdown"
        );
    }
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "stayline-server stopped"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
