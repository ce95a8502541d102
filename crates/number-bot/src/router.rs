//! Routes each received message to the relay or to a command handler.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use relay_engine::{DispatchReport, RelayEngine};
use std::sync::Arc;
use tracing::{debug, instrument};

/// What the bot should do after handling a message.
#[derive(Debug, PartialEq)]
pub enum Route {
    /// A monitor-group message was reconciled against the holdings.
    Inbound(DispatchReport),
    /// Text to send back to the sender.
    Reply(String),
    /// Nothing to do.
    Ignored,
}

pub struct Router {
    engine: Arc<RelayEngine>,
    handlers: Vec<Box<dyn CommandHandler>>,
    monitor_group_id: String,
}

impl Router {
    pub fn new(
        engine: Arc<RelayEngine>,
        handlers: Vec<Box<dyn CommandHandler>>,
        monitor_group_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            handlers,
            monitor_group_id: monitor_group_id.into(),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    #[instrument(skip(self, message), fields(sender = %message.sender))]
    pub async fn route(&self, message: &ChatMessage) -> AppResult<Route> {
        if let Some(group) = &message.group_id {
            if *group != self.monitor_group_id {
                debug!("Ignoring message from group {}", group);
                return Ok(Route::Ignored);
            }

            let report = self.engine.on_inbound_text(&message.text).await;
            return Ok(Route::Inbound(report));
        }

        if self.engine.is_banned(&message.sender).await {
            return Ok(Route::Reply("🚫 You are banned.".into()));
        }

        match self.handlers.iter().find(|h| h.matches(message)) {
            Some(handler) => {
                debug!("Dispatching to {}", handler.name());
                Ok(Route::Reply(handler.execute(message).await?))
            }
            None => Ok(Route::Ignored),
        }
    }
}
