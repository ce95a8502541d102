//! Application configuration loaded from environment variables.

use anyhow::{bail, Context, Result};
use relay_engine::MAX_NUMBER_LIMIT;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Signal configuration
    pub signal: SignalConfig,

    /// Number pool storage
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Relay state and roles
    pub relay: RelayConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Signal CLI REST API endpoint
    #[serde(default = "default_signal_service")]
    pub service_url: String,

    /// The bot's own account, e.g. "+15551234567"
    pub phone_number: String,

    /// Poll interval for messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_number_dir")]
    pub number_dir: PathBuf,

    #[serde(default = "default_seen_dir")]
    pub seen_dir: PathBuf,

    /// Seen logs untouched for longer than this are eligible for pruning
    #[serde(default = "default_seen_retention", with = "humantime_serde")]
    pub seen_retention: Duration,

    /// How often the retention pass runs
    #[serde(default = "default_cleanup_interval", with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Snapshot file
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Keep the snapshot on disk; when false state lives in memory only
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Group whose messages carry the masked numbers and codes
    pub monitor_group_id: String,

    /// Comma separated ids that are always admins
    #[serde(default, deserialize_with = "comma_list")]
    pub admin_ids: Vec<String>,

    /// Numbers per allocation until an admin changes it
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Comma separated services offered until an admin changes them
    #[serde(default = "default_services", deserialize_with = "comma_list")]
    pub default_services: Vec<String>,

    /// Shown by `!support`
    #[serde(default)]
    pub support_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            number_dir: default_number_dir(),
            seen_dir: default_seen_dir(),
            seen_retention: default_seen_retention(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_signal_service() -> String {
    "http://signal-api:8080".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_number_dir() -> PathBuf {
    "numbers".into()
}

fn default_seen_dir() -> PathBuf {
    "seen".into()
}

fn default_seen_retention() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_data_file() -> PathBuf {
    "user_data.json".into()
}

fn default_true() -> bool {
    true
}

fn default_limit() -> usize {
    4
}

fn default_services() -> Vec<String> {
    vec!["WhatsApp".into(), "Telegram".into(), "Facebook".into()]
}

fn default_log_level() -> String {
    "info".into()
}

/// "a, b,,c" -> ["a", "b", "c"]
fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_env(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_env(Some(vars))
    }

    fn from_env(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // try_parsing(true) would turn "+15551234567" into a number
                    .try_parsing(false)
                    .source(vars),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if !(1..=MAX_NUMBER_LIMIT).contains(&config.relay.default_limit) {
            bail!(
                "RELAY__DEFAULT_LIMIT must be between 1 and {}, got {}",
                MAX_NUMBER_LIMIT,
                config.relay.default_limit
            );
        }

        Ok(config)
    }
}
