//! Services command - lists services with their remaining stock.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use number_inventory::StockTier;
use relay_engine::RelayEngine;
use std::sync::Arc;

pub struct ServicesHandler {
    engine: Arc<RelayEngine>,
}

impl ServicesHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

fn icon(service: &str) -> &'static str {
    match service {
        "WhatsApp" => "💬",
        "Telegram" => "✈️",
        "Facebook" => "📘",
        _ => "📱",
    }
}

#[async_trait]
impl CommandHandler for ServicesHandler {
    fn name(&self) -> &str {
        "services"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!services")
    }

    async fn execute(&self, _message: &ChatMessage) -> AppResult<String> {
        let summaries = self.engine.service_summaries().await?;
        if summaries.is_empty() {
            return Ok("⚠️ No services available.".into());
        }

        let mut reply = String::from("📦 Services\n");
        for summary in summaries {
            reply.push_str(&format!(
                "\n{} {} {} ({})",
                StockTier::from_available(summary.available).marker(),
                icon(&summary.service),
                summary.service,
                summary.available
            ));
        }
        reply.push_str("\n\nSend !countries <service> to pick a country.");
        Ok(reply)
    }
}
