//! Bot command handlers.

mod admin;
mod countries;
mod help;
mod history;
mod number;
mod pending;
mod services;
mod start;
mod stock;
mod support;

pub use admin::AdminHandler;
pub use countries::CountriesHandler;
pub use help::HelpHandler;
pub use history::HistoryHandler;
pub use number::NumberHandler;
pub use pending::PendingInputHandler;
pub use services::ServicesHandler;
pub use start::StartHandler;
pub use stock::StockHandler;
pub use support::SupportHandler;

use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_engine::RelayEngine;
use std::sync::Arc;

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name (e.g., "help", "number").
    fn name(&self) -> &str;

    /// Command trigger (e.g., "!help").
    fn trigger(&self) -> Option<&str> {
        None
    }

    /// Whether this is the default handler for non-command messages.
    fn is_default(&self) -> bool {
        false
    }

    /// Check if this handler matches the message.
    fn matches(&self, message: &ChatMessage) -> bool {
        if let Some(trigger) = self.trigger() {
            message.command().eq_ignore_ascii_case(trigger)
        } else {
            self.is_default() && !message.text.trim_start().starts_with('!')
        }
    }

    /// Execute the command.
    async fn execute(&self, message: &ChatMessage) -> AppResult<String>;
}

/// Every handler the bot answers direct messages with.
pub fn default_handlers(
    engine: Arc<RelayEngine>,
    support_link: Option<String>,
) -> Vec<Box<dyn CommandHandler>> {
    vec![
        Box::new(StartHandler::new(engine.clone())),
        Box::new(ServicesHandler::new(engine.clone())),
        Box::new(CountriesHandler::new(engine.clone())),
        Box::new(NumberHandler::new(engine.clone())),
        Box::new(StockHandler::new(engine.clone())),
        Box::new(HistoryHandler::new(engine.clone())),
        Box::new(SupportHandler::new(support_link)),
        Box::new(HelpHandler::new()),
        Box::new(AdminHandler::new(engine.clone())),
        Box::new(PendingInputHandler::new(engine)),
    ]
}

/// Find a listed service by case-insensitive name.
pub(crate) async fn resolve_service(engine: &RelayEngine, name: &str) -> Option<String> {
    engine
        .services()
        .await
        .into_iter()
        .find(|s| s.eq_ignore_ascii_case(name.trim()))
}

/// Find a country pool of `service` by case-insensitive name.
pub(crate) async fn resolve_country(
    engine: &RelayEngine,
    service: &str,
    name: &str,
) -> AppResult<Option<String>> {
    Ok(engine
        .countries(service)
        .await?
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(name.trim())))
}

pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%d %b %Y %H:%M").to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use number_inventory::Inventory;
    use relay_engine::{DeliveryError, Notifier, RelayEngine, RelaySnapshot, SnapshotStore};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    pub const ADMIN: &str = "+15550009999";

    #[derive(Default)]
    pub struct Outbox {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for Outbox {
        async fn deliver(&self, client: &str, text: &str) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .await
                .push((client.to_string(), text.to_string()));
            Ok(())
        }
    }

    pub struct TestBot {
        pub engine: Arc<RelayEngine>,
        pub outbox: Arc<Outbox>,
        pub dir: TempDir,
    }

    pub fn test_bot() -> TestBot {
        let dir = TempDir::new().unwrap();
        let inventory = Arc::new(Inventory::new(
            dir.path().join("numbers"),
            dir.path().join("seen"),
        ));
        let outbox = Arc::new(Outbox::default());
        let engine = RelayEngine::new(
            inventory,
            RelaySnapshot::default(),
            SnapshotStore::memory(),
            vec![ADMIN.to_string()],
            outbox.clone(),
        )
        .with_seed(3);
        TestBot {
            engine: Arc::new(engine),
            outbox,
            dir,
        }
    }
}
