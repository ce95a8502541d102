//! Signal CLI REST client.

use super::error::TransportError;
use super::types::*;
use async_trait::async_trait;
use relay_engine::{DeliveryError, Notifier};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Client for one Signal account behind signal-cli-rest-api.
#[derive(Clone)]
pub struct SignalClient {
    client: Client,
    base_url: String,
    account: String,
}

impl SignalClient {
    pub fn new(
        base_url: impl Into<String>,
        account: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account: account.into(),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Fetch pending envelopes and keep the text messages.
    #[instrument(skip(self))]
    pub async fn receive(&self) -> Result<Vec<ChatMessage>, TransportError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/receive/{}",
                self.base_url,
                encode(&self.account)
            ))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelopes: Vec<ReceivedEnvelope> = response.json().await?;
        let messages: Vec<ChatMessage> = envelopes
            .iter()
            .filter_map(ChatMessage::from_envelope)
            .collect();
        debug!(
            "Received {} envelopes, {} text messages",
            envelopes.len(),
            messages.len()
        );
        Ok(messages)
    }

    /// Send a text message to one recipient.
    #[instrument(skip(self, message))]
    pub async fn send(&self, recipient: &str, message: &str) -> Result<(), TransportError> {
        let request = SendRequest {
            message,
            number: &self.account,
            recipients: vec![recipient],
        };

        let response = self
            .client
            .post(format!("{}/v2/send", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Send failed: {}", body);
            return Err(TransportError::SendFailed(body));
        }

        debug!("Sent message to {}", recipient);
        Ok(())
    }
}

#[async_trait]
impl Notifier for SignalClient {
    async fn deliver(&self, client: &str, text: &str) -> Result<(), DeliveryError> {
        self.send(client, text)
            .await
            .map_err(|e| DeliveryError(e.to_string()))
    }
}
