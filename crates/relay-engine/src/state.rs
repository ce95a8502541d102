//! Process-wide relay state and its persisted form.

use crate::types::{ClientId, ClientStats, HistoryEntry, Holder, MatchEvent};
use chrono::{DateTime, Utc};
use number_inventory::PoolKey;
use otp_parser::{format_number, MaskedNumber};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Data version for schema migrations.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Entries kept per client history.
pub const HISTORY_LIMIT: usize = 50;

/// Entries kept in the global match log.
pub const MATCH_LOG_LIMIT: usize = 50;

/// Numbers handed out per allocation unless configured otherwise.
pub const DEFAULT_NUMBER_LIMIT: usize = 4;

pub fn default_services() -> Vec<String> {
    vec!["WhatsApp".into(), "Telegram".into(), "Facebook".into()]
}

/// Everything the relay persists, written whole after each mutation.
///
/// Keyed maps are ordered so holder scans and the snapshot file are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySnapshot {
    /// Schema version for migrations.
    pub version: u32,
    pub stats: BTreeMap<ClientId, ClientStats>,
    /// Latest batch per client; the only state consulted for matching.
    pub holdings: BTreeMap<ClientId, Vec<String>>,
    pub last_active: BTreeMap<ClientId, DateTime<Utc>>,
    pub history: BTreeMap<ClientId, Vec<HistoryEntry>>,
    pub banned: BTreeSet<ClientId>,
    pub admins: BTreeSet<ClientId>,
    /// Every client that ever started a session.
    pub clients: BTreeSet<ClientId>,
    pub match_log: Vec<MatchEvent>,
    pub number_limit: usize,
    pub services: Vec<String>,
}

impl Default for RelaySnapshot {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_NUMBER_LIMIT, default_services())
    }
}

impl RelaySnapshot {
    pub fn with_defaults(number_limit: usize, services: Vec<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            stats: BTreeMap::new(),
            holdings: BTreeMap::new(),
            last_active: BTreeMap::new(),
            history: BTreeMap::new(),
            banned: BTreeSet::new(),
            admins: BTreeSet::new(),
            clients: BTreeSet::new(),
            match_log: Vec::new(),
            number_limit,
            services,
        }
    }

    /// Apply a served batch: replace the holding, extend history and stats.
    pub fn record_allocation(
        &mut self,
        client: &str,
        key: &PoolKey,
        numbers: &[String],
        at: DateTime<Utc>,
    ) {
        self.stats
            .entry(client.to_string())
            .or_default()
            .record(&key.service, &key.country, numbers.len() as u64);

        self.holdings.insert(client.to_string(), numbers.to_vec());

        let history = self.history.entry(client.to_string()).or_default();
        history.extend(numbers.iter().map(|n| HistoryEntry {
            service: key.service.clone(),
            country: key.country.clone(),
            number: format_number(n),
            time: at,
        }));
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            history.drain(..excess);
        }

        self.last_active.insert(client.to_string(), at);
    }

    /// Clients whose current holding fits the mask, at most once per client.
    pub fn holders_of(&self, mask: &MaskedNumber) -> Vec<Holder> {
        self.holdings
            .iter()
            .filter_map(|(client, numbers)| {
                numbers.iter().find(|n| mask.matches(n)).map(|n| Holder {
                    client: client.clone(),
                    number: n.clone(),
                })
            })
            .collect()
    }

    pub fn record_match(&mut self, event: MatchEvent) {
        self.match_log.push(event);
        if self.match_log.len() > MATCH_LOG_LIMIT {
            let excess = self.match_log.len() - MATCH_LOG_LIMIT;
            self.match_log.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PoolKey {
        PoolKey::new("Telegram", "India")
    }

    fn numbers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_record_allocation_replaces_holding() {
        let mut state = RelaySnapshot::default();
        let now = Utc::now();

        state.record_allocation("alice", &key(), &numbers(&["911", "912"]), now);
        state.record_allocation("alice", &key(), &numbers(&["913"]), now);

        assert_eq!(state.holdings["alice"], numbers(&["913"]));
        assert_eq!(state.history["alice"].len(), 3);
        assert_eq!(state.stats["alice"].total, 3);
        assert_eq!(state.stats["alice"].services["Telegram"]["India"], 3);
        assert_eq!(state.last_active["alice"], now);
    }

    #[test]
    fn test_history_formats_numbers() {
        let mut state = RelaySnapshot::default();

        state.record_allocation("alice", &key(), &numbers(&["919999000001"]), Utc::now());

        let entry = &state.history["alice"][0];
        assert_eq!(entry.number, "+919999000001");
        assert_eq!(entry.service, "Telegram");
        assert_eq!(entry.country, "India");
    }

    #[test]
    fn test_history_is_bounded_keeping_latest() {
        let mut state = RelaySnapshot::default();

        for i in 0..60 {
            let batch = vec![format!("9100000{:04}", i)];
            state.record_allocation("alice", &key(), &batch, Utc::now());
        }

        let history = &state.history["alice"];
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].number, "+91000000010");
        assert_eq!(history[49].number, "+91000000059");
    }

    #[test]
    fn test_match_log_is_bounded() {
        let mut state = RelaySnapshot::default();

        for i in 0..55 {
            state.record_match(MatchEvent {
                time: Utc::now(),
                number: format!("+1{}", i),
                code: None,
                client: "alice".into(),
            });
        }

        assert_eq!(state.match_log.len(), MATCH_LOG_LIMIT);
        assert_eq!(state.match_log[0].number, "+15");
    }

    #[test]
    fn test_holders_reports_each_client_once() {
        let mut state = RelaySnapshot::default();
        state
            .holdings
            .insert("alice".into(), numbers(&["+8801711005678", "+8801722005678"]));
        state.holdings.insert("bob".into(), numbers(&["+8801733009999"]));
        state.holdings.insert("carol".into(), numbers(&["+8801744005678"]));

        let mask = MaskedNumber::new("880", 6, "5678");
        let holders = state.holders_of(&mask);

        assert_eq!(
            holders,
            vec![
                Holder {
                    client: "alice".into(),
                    number: "+8801711005678".into()
                },
                Holder {
                    client: "carol".into(),
                    number: "+8801744005678".into()
                },
            ]
        );
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_fields() {
        let json = r#"{
            "holdings": {"alice": ["111"]},
            "number_limit": 2
        }"#;

        let state: RelaySnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(state.number_limit, 2);
        assert_eq!(state.services, default_services());
        assert_eq!(state.holdings["alice"], numbers(&["111"]));
        assert!(state.match_log.is_empty());
    }

    #[test]
    fn test_snapshot_serialization_keys() {
        let json = serde_json::to_string(&RelaySnapshot::default()).unwrap();

        for field in [
            "\"version\"",
            "\"stats\"",
            "\"holdings\"",
            "\"last_active\"",
            "\"history\"",
            "\"banned\"",
            "\"admins\"",
            "\"clients\"",
            "\"match_log\"",
            "\"number_limit\"",
            "\"services\"",
        ] {
            assert!(json.contains(field), "missing {field}");
        }
    }
}
