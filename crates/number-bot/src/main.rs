//! Number Bot - Main entry point.

use anyhow::Context;
use number_bot::commands::default_handlers;
use number_bot::config::Config;
use number_bot::error::AppResult;
use number_bot::retention::spawn_retention;
use number_bot::router::{Route, Router};
use number_bot::transport::{MessageReceiver, SignalClient};
use number_inventory::Inventory;
use relay_engine::{RelayDefaults, RelayEngine, SnapshotStore};
use std::sync::Arc;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Number Bot...");

    let inventory = Arc::new(Inventory::new(
        &config.inventory.number_dir,
        &config.inventory.seen_dir,
    ));

    let signal = SignalClient::new(&config.signal.service_url, &config.signal.phone_number)
        .context("Failed to create Signal client")?;

    let store = if config.relay.persist {
        SnapshotStore::file(&config.relay.data_file)
    } else {
        warn!("Persistence disabled - relay state lives in memory only");
        SnapshotStore::memory()
    };

    let engine = Arc::new(
        RelayEngine::open(
            inventory.clone(),
            store,
            RelayDefaults {
                number_limit: config.relay.default_limit,
                services: config.relay.default_services.clone(),
                admins: config.relay.admin_ids.clone(),
            },
            Arc::new(signal.clone()),
        )
        .await
        .context("Failed to load relay state")?,
    );

    info!(
        "Relay ready: {} services, limit {} per request, {} configured admins",
        engine.services().await.len(),
        engine.number_limit().await,
        config.relay.admin_ids.len()
    );

    if !signal.health_check().await {
        error!("Signal API not reachable at {}", config.signal.service_url);
        return Err(anyhow::anyhow!("Signal API not reachable").into());
    }
    info!("Signal API healthy");

    let retention = spawn_retention(
        inventory,
        config.inventory.seen_retention,
        config.inventory.cleanup_interval,
    );

    let router = Router::new(
        engine.clone(),
        default_handlers(engine.clone(), config.relay.support_link.clone()),
        &config.relay.monitor_group_id,
    );

    info!("Registered {} command handlers", router.handler_count());
    info!("Monitoring group {}", config.relay.monitor_group_id);
    info!("Listening for messages...");

    // Start message receiver
    let receiver = MessageReceiver::new(signal.clone(), config.signal.poll_interval);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                match router.route(&message).await {
                    Ok(Route::Reply(response)) => {
                        if let Err(e) = signal.send(&message.sender, &response).await {
                            error!("Failed to send reply: {}", e);
                        }
                    }
                    Ok(Route::Inbound(_)) | Ok(Route::Ignored) => {}
                    Err(e) => {
                        error!("Handler error: {}", e);
                        let _ = signal
                            .send(&message.sender, "Sorry, something went wrong.")
                            .await;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    retention.abort();
    if let Err(e) = engine.persist().await {
        error!("Final snapshot failed: {}", e);
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
