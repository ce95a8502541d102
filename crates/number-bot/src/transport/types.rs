//! Signal REST payloads and the parsed chat message.

use serde::{Deserialize, Serialize};

/// One entry of `GET /v1/receive/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedEnvelope {
    pub envelope: Envelope,
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_number: Option<String>,
    #[serde(default)]
    pub source_uuid: Option<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub data_message: Option<DataMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub group_info: Option<GroupInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub group_id: String,
}

/// Body of `POST /v2/send`.
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest<'a> {
    pub message: &'a str,
    pub number: &'a str,
    pub recipients: Vec<&'a str>,
}

/// A text message addressed to the bot, directly or through a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Phone number (or uuid when the number is hidden) of the author.
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
    pub group_id: Option<String>,
}

impl ChatMessage {
    /// A direct message from `sender`.
    pub fn direct(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            group_id: None,
        }
    }

    /// A message posted in a group.
    pub fn in_group(
        sender: impl Into<String>,
        group_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            group_id: Some(group_id.into()),
            ..Self::direct(sender, text)
        }
    }

    /// Extract the text message from an envelope. Receipts, typing
    /// indicators and empty messages yield `None`.
    pub fn from_envelope(received: &ReceivedEnvelope) -> Option<Self> {
        let envelope = &received.envelope;
        let data = envelope.data_message.as_ref()?;
        let text = data.message.clone().filter(|t| !t.trim().is_empty())?;
        let sender = envelope
            .source_number
            .clone()
            .or_else(|| envelope.source.clone())
            .or_else(|| envelope.source_uuid.clone())?;

        Some(Self {
            sender,
            text,
            timestamp: envelope.timestamp,
            group_id: data.group_info.as_ref().map(|g| g.group_id.clone()),
        })
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// The first whitespace-delimited word, e.g. "!number".
    pub fn command(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    /// Everything after the command word on the first line.
    pub fn args(&self) -> &str {
        let first_line = self.text.lines().next().unwrap_or("").trim_start();
        first_line
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }

    /// Lines after the first, trimmed, blanks dropped.
    pub fn body_lines(&self) -> Vec<&str> {
        self.text
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}
