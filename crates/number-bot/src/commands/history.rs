//! History command - the client's latest numbers.

use crate::commands::{format_time, CommandHandler};
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use relay_engine::RelayEngine;
use std::sync::Arc;

/// Entries shown per request.
const SHOWN: usize = 15;

pub struct HistoryHandler {
    engine: Arc<RelayEngine>,
}

impl HistoryHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for HistoryHandler {
    fn name(&self) -> &str {
        "history"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!history")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        let history = self.engine.history(&message.sender, SHOWN).await;
        if history.is_empty() {
            return Ok("📭 You have no history yet.".into());
        }

        let lines: Vec<String> = history
            .iter()
            .map(|entry| {
                format!(
                    "📱 {}  ›  {}  ›  {}\n    🕐 {}",
                    entry.number,
                    entry.service,
                    entry.country,
                    format_time(&entry.time)
                )
            })
            .collect();

        Ok(format!("🕘 Your latest numbers:\n\n{}", lines.join("\n\n")))
    }
}
