//! Stock command - live stock of every pool.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use relay_engine::RelayEngine;
use std::sync::Arc;

pub struct StockHandler {
    engine: Arc<RelayEngine>,
}

impl StockHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for StockHandler {
    fn name(&self) -> &str {
        "stock"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!stock")
    }

    async fn execute(&self, _message: &ChatMessage) -> AppResult<String> {
        let report = self.engine.stock_report().await?;
        if report.is_empty() {
            return Ok("📊 Live stock\n\n⚠️ No numbers loaded.".into());
        }

        let lines: Vec<String> = report
            .iter()
            .map(|pool| {
                format!(
                    "{} {}\n    ┗ left: {}  |  total: {}  |  used: {}",
                    pool.stock.tier().marker(),
                    pool.key,
                    pool.stock.available,
                    pool.stock.total,
                    pool.stock.used
                )
            })
            .collect();

        Ok(format!("📊 Live stock\n\n{}", lines.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::test_bot;
    use number_inventory::PoolKey;

    #[tokio::test]
    async fn test_reports_each_pool() {
        let bot = test_bot();
        let key = PoolKey::new("Facebook", "Kenya");
        bot.engine
            .inventory()
            .append(&key, &["254700000001", "254700000002"])
            .await
            .unwrap();
        bot.engine
            .allocate_with_limit("+1", &key, 1)
            .await
            .unwrap();

        let reply = StockHandler::new(bot.engine.clone())
            .execute(&ChatMessage::direct("+1", "!stock"))
            .await
            .unwrap();

        assert!(reply.contains("🟡 Facebook › Kenya"));
        assert!(reply.contains("left: 1  |  total: 2  |  used: 1"));
    }

    #[tokio::test]
    async fn test_empty_inventory() {
        let bot = test_bot();

        let reply = StockHandler::new(bot.engine.clone())
            .execute(&ChatMessage::direct("+1", "!stock"))
            .await
            .unwrap();

        assert!(reply.contains("No numbers loaded"));
    }
}
