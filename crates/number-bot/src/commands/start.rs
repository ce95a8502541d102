//! Start command - registers the client and shows the menu.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use relay_engine::{EngineError, RelayEngine};
use std::sync::Arc;

pub struct StartHandler {
    engine: Arc<RelayEngine>,
}

impl StartHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!start")
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        match self.engine.register_client(&message.sender).await {
            Ok(_) => Ok(r#"✨ Number Bot ✨

🌍 Get numbers from many countries
🔔 The bot forwards your verification codes as they arrive

!services - Services and stock
!countries <service> - Countries for a service
!number <service> <country> - Get numbers
!help - All commands"#
                .into()),
            Err(EngineError::Banned(_)) => Ok("🚫 You are banned.".into()),
            Err(e) => Err(e.into()),
        }
    }
}
