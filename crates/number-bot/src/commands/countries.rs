//! Countries command - lists the country pools of a service.

use crate::commands::{resolve_service, CommandHandler};
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use number_inventory::PoolKey;
use relay_engine::RelayEngine;
use std::sync::Arc;

pub struct CountriesHandler {
    engine: Arc<RelayEngine>,
}

impl CountriesHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for CountriesHandler {
    fn name(&self) -> &str {
        "countries"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!countries")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        let requested = message.args();
        if requested.is_empty() {
            return Ok("Usage: !countries <service>".into());
        }
        let Some(service) = resolve_service(&self.engine, requested).await else {
            return Ok(format!("⚠️ Unknown service: {requested}"));
        };

        let countries = self.engine.countries(&service).await?;
        if countries.is_empty() {
            return Ok(format!("⚠️ {service} has no countries yet."));
        }

        let mut reply = format!("📦 {service} › countries\n🟢 plenty  🟡 low  🔴 empty\n");
        for country in countries {
            let stock = self
                .engine
                .inventory()
                .stock(&PoolKey::new(service.as_str(), country.as_str()))
                .await?;
            reply.push_str(&format!(
                "\n{} {} ({})",
                stock.tier().marker(),
                country,
                stock.available
            ));
        }
        reply.push_str(&format!("\n\nSend !number {service} <country> to get numbers."));
        Ok(reply)
    }
}
