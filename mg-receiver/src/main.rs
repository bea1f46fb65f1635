//! mg-receiver - Mailgun reply webhook receiver.
//!
//! This binary:
//! - Loads configuration from the environment and the recipients file
//! - Opens the dedup store (refusing to start if it is unavailable)
//! - Spawns the sender and subscriber workers
//! - Serves the webhook endpoint until SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mg_receiver::web::router;
use mg_receiver::{
    AppContext, Config, DedupStore, Dispatcher, MailgunClient, Recipients, SenderWorker,
    SubscriberWorker,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("receiver_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        api_key_set = !config.api_key.is_empty(),
        db_path = %config.db_path,
        config_path = %config.config_path,
        api_base = %config.api_base,
        signature_max_age = config.signature_max_age,
        "config_loaded"
    );

    config.validate().context("Invalid configuration")?;

    let recipients = Recipients::load(&config.config_path)
        .with_context(|| format!("Failed to load recipients from {}", config.config_path))?;
    info!(
        senders = recipients.senders.len(),
        subscribers = recipients.subscribers.len(),
        "recipients_loaded"
    );
    let recipients = Arc::new(recipients);

    let store = DedupStore::open(&config.db_path)
        .await
        .context("Failed to open dedup store")?;

    let client = MailgunClient::new(
        &config.api_base,
        &config.api_key,
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to create HTTP client")?;

    let (dispatcher, queues) = Dispatcher::new();
    let sender = tokio::spawn(
        SenderWorker::new(client.clone(), Arc::clone(&recipients), queues.sender).run(),
    );
    let subscriber = tokio::spawn(
        SubscriberWorker::new(client, Arc::clone(&recipients), queues.subscriber).run(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let ctx = AppContext::new(config, recipients, store.clone(), dispatcher);
    let app = router(ctx);

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router held the last dispatcher; workers drain and exit.
    let _ = tokio::join!(sender, subscriber);
    store.close().await;

    info!("receiver_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
