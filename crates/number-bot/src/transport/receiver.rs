//! Polling message stream.

use super::client::SignalClient;
use super::types::ChatMessage;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

/// Wait after a failed poll before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Polls the receive endpoint and yields text messages.
pub struct MessageReceiver {
    client: SignalClient,
    poll_interval: Duration,
}

impl MessageReceiver {
    pub fn new(client: SignalClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    pub fn stream(self) -> impl Stream<Item = ChatMessage> {
        async_stream::stream! {
            loop {
                match self.client.receive().await {
                    Ok(messages) => {
                        for message in messages {
                            debug!(
                                sender = %message.sender,
                                group = message.is_group(),
                                "Received {} chars",
                                message.text.chars().count()
                            );
                            yield message;
                        }
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        sleep(ERROR_BACKOFF).await;
                        continue;
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
