//! Outbound delivery seam.

use async_trait::async_trait;
use otp_parser::format_number;
use thiserror::Error;

/// Characters of the original message quoted in a notification.
pub const EXCERPT_CHARS: usize = 200;

/// A delivery that the transport could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Sends text to a client.
///
/// Implemented by the chat transport; tests substitute a recorder.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, client: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Build the notification a holder receives when a message matches.
pub fn compose_notification(number: &str, code: Option<&str>, original: &str) -> String {
    let excerpt: String = original.chars().take(EXCERPT_CHARS).collect();
    let number = format_number(number);

    match code {
        Some(code) => format!(
            "🔐 Verification code received\n\n📞 Number: {number}\n🔑 Code: {code}\n\n💬 Message:\n{excerpt}"
        ),
        None => format!("📨 New message received\n\n📞 Number: {number}\n\n💬 Message:\n{excerpt}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_with_code() {
        let text = compose_notification("8801711005678", Some("123456"), "Your code is 123456");

        assert!(text.contains("+8801711005678"));
        assert!(text.contains("🔑 Code: 123456"));
        assert!(text.contains("Your code is 123456"));
    }

    #[test]
    fn test_notification_without_code() {
        let text = compose_notification("+15550001111", None, "hello there");

        assert!(text.starts_with("📨"));
        assert!(text.contains("+15550001111"));
        assert!(!text.contains("Code:"));
    }

    #[test]
    fn test_excerpt_truncated_on_char_boundary() {
        let original = "কোড".repeat(150);

        let text = compose_notification("1", None, &original);
        let excerpt = text.rsplit('\n').next().unwrap();

        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS);
    }
}
