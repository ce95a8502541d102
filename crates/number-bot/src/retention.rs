//! Periodic pruning of stale seen logs.

use number_inventory::Inventory;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the retention loop. Every `interval` it removes seen logs older
/// than `max_age` whose pools have run dry.
pub fn spawn_retention(
    inventory: Arc<Inventory>,
    max_age: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    info!(
        "Seen log retention enabled (max_age={:?}, interval={:?})",
        max_age, interval
    );

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match inventory.prune_seen(max_age).await {
                Ok(removed) => debug!("Retention pass removed {} seen logs", removed),
                Err(e) => warn!("Seen log pruning failed: {}", e),
            }
        }
    })
}
