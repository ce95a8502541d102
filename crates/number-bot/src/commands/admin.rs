//! Admin command - limits, services, pools, statistics and two-step actions.

use crate::commands::{format_time, resolve_service, CommandHandler};
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use number_inventory::{PoolKey, StockTier};
use relay_engine::{EngineError, PendingAdminAction, RelayEngine, MAX_NUMBER_LIMIT};
use std::sync::Arc;
use tracing::info;

const USAGE: &str = r#"⚙️ Admin commands

!admin stats - Statistics dashboard
!admin status - Active holders and latest codes
!admin limit <1-10> - Numbers per request
!admin removeservice <name> - Remove a service
!admin compact - Remove duplicate numbers from every pool
!admin clear <service> <country> - Empty a pool
!admin upload <service> <country> - Append the numbers on the following lines
!admin addadmin | removeadmin | ban | unban | addservice | broadcast - Then send the value
!admin cancel - Cancel a pending action"#;

pub struct AdminHandler {
    engine: Arc<RelayEngine>,
}

impl AdminHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }

    async fn panel(&self, admin: &str) -> AppResult<String> {
        let stats = self.engine.statistics(admin).await?;
        Ok(format!(
            "⚙️ Admin panel\n\n👥 Users: {}\n📲 Limit: {} per request\n📦 Services: {}\n\n{}",
            stats.clients,
            self.engine.number_limit().await,
            self.engine.services().await.join(", "),
            USAGE
        ))
    }

    async fn stats(&self, admin: &str) -> AppResult<String> {
        let stats = self.engine.statistics(admin).await?;

        let mut reply = format!(
            "📊 Statistics\n\n👥 Users: {}\n🚫 Banned: {}\n🛡 Admins: {}\n📲 Numbers: {}\n\n📦 Services:\n",
            stats.clients, stats.banned, stats.admins, stats.total_numbers
        );
        for service in &stats.services {
            reply.push_str(&format!(
                "\n{} {}\n    ┗ total: {}  |  left: {}",
                StockTier::from_available(service.available).marker(),
                service.service,
                service.total,
                service.available
            ));
        }

        if !stats.top_clients.is_empty() {
            reply.push_str("\n\n🏆 Top users:\n");
            for (rank, client) in stats.top_clients.iter().enumerate() {
                let last = client
                    .last_active
                    .as_ref()
                    .map(format_time)
                    .unwrap_or_else(|| "N/A".into());
                reply.push_str(&format!(
                    "\n{}. {} ┄ {} ┄ {}",
                    rank + 1,
                    client.client,
                    client.total,
                    last
                ));
            }
        }
        Ok(reply)
    }

    async fn status(&self, admin: &str) -> AppResult<String> {
        let status = self.engine.match_status(admin).await?;

        let mut reply = if status.active.is_empty() {
            "📊 Code status\n\nNo active users right now.".to_string()
        } else {
            let lines: Vec<String> = status
                .active
                .iter()
                .map(|holding| {
                    let last = holding
                        .last_active
                        .as_ref()
                        .map(format_time)
                        .unwrap_or_else(|| "N/A".into());
                    format!(
                        "👤 {}\n    ┗ {} numbers  |  {}",
                        holding.client, holding.numbers, last
                    )
                })
                .collect();
            format!("📊 Active users:\n\n{}", lines.join("\n\n"))
        };

        if !status.recent.is_empty() {
            reply.push_str("\n\n📋 Latest codes:\n");
            for event in &status.recent {
                reply.push_str(&format!(
                    "\n🕐 {}\n    📱 {}  🔢 {}",
                    format_time(&event.time),
                    event.number,
                    event.code.as_deref().unwrap_or("N/A")
                ));
            }
        }
        Ok(reply)
    }

    async fn compact(&self, admin: &str) -> AppResult<String> {
        let reports = self.engine.compact_all(admin).await?;
        if reports.is_empty() {
            return Ok("⚠️ No pools to compact.".into());
        }

        let mut total = 0;
        let mut lines = Vec::new();
        for report in &reports {
            match &report.result {
                Ok(count) => {
                    total += count;
                    lines.push(format!("✅ {}: {}", report.key, count));
                }
                Err(e) => lines.push(format!("❌ {}: {}", report.key, e)),
            }
        }
        Ok(format!(
            "🧹 Duplicates removed\n\n{}\n\nNumbers left: {}",
            lines.join("\n"),
            total
        ))
    }

    /// Parse "<service> <country...>" against the listed services.
    async fn pool_key(&self, args: &str) -> Option<PoolKey> {
        let (service, country) = args.split_once(char::is_whitespace)?;
        let service = resolve_service(&self.engine, service).await?;
        Some(PoolKey::new(service, country.trim()))
    }

    async fn run(&self, message: &ChatMessage) -> Result<String, EngineError> {
        let admin = message.sender.as_str();
        let args = message.args();
        let (sub, rest) = args
            .split_once(char::is_whitespace)
            .map(|(s, r)| (s, r.trim()))
            .unwrap_or((args, ""));

        let reply = match sub.to_ascii_lowercase().as_str() {
            "limit" => {
                let limit: usize = rest.parse().map_err(|_| {
                    EngineError::InvalidInput(format!("limit must be 1-{MAX_NUMBER_LIMIT}"))
                })?;
                self.engine.set_limit(admin, limit).await?;
                format!("✅ Limit updated: {limit} per request")
            }
            "removeservice" => {
                if self.engine.remove_service(admin, rest).await? {
                    format!("✅ Service removed: {rest}")
                } else {
                    format!("⚠️ No such service: {rest}")
                }
            }
            "clear" => {
                let Some(typed) = self.pool_key(rest).await else {
                    return Ok("Usage: !admin clear <service> <country>".into());
                };
                let existing = self
                    .engine
                    .countries(&typed.service)
                    .await?
                    .into_iter()
                    .find(|c| c.eq_ignore_ascii_case(&typed.country));
                let Some(country) = existing else {
                    return Ok(format!(
                        "⚠️ {} has no pool for {}",
                        typed.service, typed.country
                    ));
                };
                let key = PoolKey::new(typed.service, country);
                let removed = self.engine.clear_pool(admin, &key).await?;
                format!("✅ Removed {removed} numbers from {key}")
            }
            "upload" => {
                let Some(key) = self.pool_key(rest).await else {
                    return Ok("Usage: !admin upload <service> <country>, numbers on the next lines".into());
                };
                let lines = message.body_lines();
                if lines.is_empty() {
                    return Ok("❌ No numbers in the upload.".into());
                }
                let added = self.engine.upload(admin, &key, &lines).await?;
                info!("Uploaded {} numbers to {}", added, key);
                format!("✅ Added\n\n📱 Service: {}\n🌍 Country: {}\n📲 Numbers: {}", key.service, key.country, added)
            }
            "cancel" => {
                if self.engine.cancel_admin_action(admin).await {
                    "Cancelled.".to_string()
                } else {
                    "Nothing to cancel.".to_string()
                }
            }
            other => match PendingAdminAction::parse(other) {
                Some(action) => self.engine.begin_admin_action(admin, action).await?.to_string(),
                None => USAGE.to_string(),
            },
        };
        Ok(reply)
    }
}

#[async_trait]
impl CommandHandler for AdminHandler {
    fn name(&self) -> &str {
        "admin"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!admin")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        if !self.engine.is_admin(&message.sender).await {
            return Ok("❌ You are not an admin.".into());
        }

        let sub = message.args().split_whitespace().next().unwrap_or("");
        let result = match sub.to_ascii_lowercase().as_str() {
            "" => return self.panel(&message.sender).await,
            "stats" => return self.stats(&message.sender).await,
            "status" => return self.status(&message.sender).await,
            "compact" => return self.compact(&message.sender).await,
            _ => self.run(message).await,
        };

        match result {
            Ok(reply) => Ok(reply),
            Err(e @ (EngineError::InvalidInput(_) | EngineError::UnknownService(_))) => {
                Ok(format!("❌ {e}"))
            }
            Err(e) => Err(e.into()),
        }
    }
}
