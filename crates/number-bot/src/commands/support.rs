//! Support command.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;

pub struct SupportHandler {
    link: Option<String>,
}

impl SupportHandler {
    pub fn new(link: Option<String>) -> Self {
        Self { link }
    }
}

#[async_trait]
impl CommandHandler for SupportHandler {
    fn name(&self) -> &str {
        "support"
    }

    fn trigger(&self) -> Option<&str> {
        Some("!support")
    }

    async fn execute(&self, _message: &ChatMessage) -> AppResult<String> {
        Ok(match &self.link {
            Some(link) => format!("☎️ Support\n\nFor any problem, contact:\n👉 {link}"),
            None => "☎️ Support\n\nAsk an admin in this chat.".into(),
        })
    }
}
