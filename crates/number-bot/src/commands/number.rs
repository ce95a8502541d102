//! Number command - allocates fresh numbers from a pool.

use crate::commands::{resolve_country, resolve_service, CommandHandler};
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use number_inventory::PoolKey;
use otp_parser::format_number;
use relay_engine::{Allocation, EngineError, RelayEngine};
use std::sync::Arc;
use tracing::info;

pub struct NumberHandler {
    engine: Arc<RelayEngine>,
}

impl NumberHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for NumberHandler {
    fn name(&self) -> &str {
        "number"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!number")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        // Country names may contain spaces: "!number WhatsApp Saudi Arabia"
        let Some((service, country)) = message.args().split_once(char::is_whitespace) else {
            return Ok("Usage: !number <service> <country>".into());
        };

        let Some(service) = resolve_service(&self.engine, service).await else {
            return Ok(format!("⚠️ Unknown service: {service}"));
        };
        let Some(country) = resolve_country(&self.engine, &service, country).await? else {
            return Ok(format!("⚠️ {service} has no pool for {}", country.trim()));
        };

        let key = PoolKey::new(service, country);
        match self.engine.allocate(&message.sender, &key).await {
            Ok(Allocation::Issued(numbers)) => {
                info!("Issued {} numbers from {}", numbers.len(), key);
                let mut reply = format!("⚡ New numbers\n\n📦 {key} ┄ {}\n", numbers.len());
                for number in &numbers {
                    reply.push_str(&format!("\n📲 {}", format_number(number)));
                }
                reply.push_str("\n\n🔔 Codes are forwarded here as they arrive.");
                Ok(reply)
            }
            Ok(Allocation::OutOfStock) => Ok(format!(
                "❌ Out of stock\n\n📦 {key}\n\nNo numbers left right now. Try again later."
            )),
            Err(EngineError::Banned(_)) => Ok("🚫 You are banned.".into()),
            Err(e) => Err(e.into()),
        }
    }
}
