//! Default handler - completes a pending admin action with the message text.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::transport::ChatMessage;
use async_trait::async_trait;
use relay_engine::{EngineError, RelayEngine};
use std::sync::Arc;

const HINT: &str = "Send !help to see the commands.";

pub struct PendingInputHandler {
    engine: Arc<RelayEngine>,
}

impl PendingInputHandler {
    pub fn new(engine: Arc<RelayEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CommandHandler for PendingInputHandler {
    fn name(&self) -> &str {
        "pending"
    }

    fn is_default(&self) -> bool {
        true
    }

    async fn execute(&self, message: &ChatMessage) -> AppResult<String> {
        if !self.engine.has_pending_action(&message.sender).await {
            return Ok(HINT.into());
        }

        match self
            .engine
            .complete_admin_action(&message.sender, &message.text)
            .await
        {
            Ok(Some(outcome)) => Ok(outcome.to_string()),
            Ok(None) => Ok(HINT.into()),
            Err(e @ EngineError::InvalidInput(_)) => Ok(format!("❌ {e}")),
            Err(EngineError::NotAdmin(_)) => Ok(HINT.into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{test_bot, ADMIN};
    use relay_engine::PendingAdminAction;

    #[tokio::test]
    async fn test_hint_without_pending_action() {
        let bot = test_bot();
        let handler = PendingInputHandler::new(bot.engine.clone());

        let reply = handler
            .execute(&ChatMessage::direct("+15551230000", "hello"))
            .await
            .unwrap();

        assert_eq!(reply, HINT);
    }

    #[tokio::test]
    async fn test_completes_ban() {
        let bot = test_bot();
        let handler = PendingInputHandler::new(bot.engine.clone());
        bot.engine
            .begin_admin_action(ADMIN, PendingAdminAction::Ban)
            .await
            .unwrap();

        let reply = handler
            .execute(&ChatMessage::direct(ADMIN, " +15551230000 "))
            .await
            .unwrap();

        assert_eq!(reply, "🚫 Banned: +15551230000");
        assert!(bot.engine.is_banned("+15551230000").await);
        assert!(!bot.engine.has_pending_action(ADMIN).await);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_registered_clients() {
        let bot = test_bot();
        let handler = PendingInputHandler::new(bot.engine.clone());
        bot.engine.register_client("+15551110000").await.unwrap();
        bot.engine.register_client("+15552220000").await.unwrap();
        bot.engine
            .begin_admin_action(ADMIN, PendingAdminAction::Broadcast)
            .await
            .unwrap();

        let reply = handler
            .execute(&ChatMessage::direct(ADMIN, "Maintenance at noon"))
            .await
            .unwrap();

        assert_eq!(reply, "✅ Sent to 2 users");
        let sent = bot.outbox.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.contains("Maintenance at noon"));
    }

    #[tokio::test]
    async fn test_invalid_service_name_is_a_reply() {
        let bot = test_bot();
        let handler = PendingInputHandler::new(bot.engine.clone());
        bot.engine
            .begin_admin_action(ADMIN, PendingAdminAction::AddService)
            .await
            .unwrap();

        let reply = handler
            .execute(&ChatMessage::direct(ADMIN, "../etc"))
            .await
            .unwrap();

        assert!(reply.starts_with("❌"));
        assert!(!bot.engine.has_pending_action(ADMIN).await);
    }
}
