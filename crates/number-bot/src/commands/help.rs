//! Help command - displays available commands.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!help")
    }

    async fn execute(&self, _message: &ChatMessage) -> AppResult<String> {
        Ok(r#"**Number Bot**

**Commands:**
- !start - Register and show the menu
- !services - Services and how many numbers are left
- !countries <service> - Countries for a service
- !number <service> <country> - Get fresh numbers
- !stock - Live stock of every pool
- !history - Your latest numbers
- !support - Contact support
- !help - Show this message

**How it works:**
Each !number request gives you a new batch. When a verification message for one of your latest numbers arrives, the bot forwards the code to you. Older batches stop receiving codes once you take a new one.

**Admins:** send !admin for the admin commands."#
            .into())
    }
}
