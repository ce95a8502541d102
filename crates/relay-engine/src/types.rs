//! Core types shared by the engine and its callers.

use chrono::{DateTime, Utc};
use number_inventory::{PoolKey, StockLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a client (the chat account that receives numbers).
pub type ClientId = String;

/// Cumulative count of numbers a client has received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStats {
    pub total: u64,
    /// service → country → count
    pub services: BTreeMap<String, BTreeMap<String, u64>>,
}

impl ClientStats {
    pub fn record(&mut self, service: &str, country: &str, count: u64) {
        self.total = self.total.saturating_add(count);
        let per_country = self
            .services
            .entry(service.to_string())
            .or_default()
            .entry(country.to_string())
            .or_default();
        *per_country = per_country.saturating_add(count);
    }
}

/// One number in a client's display history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub service: String,
    pub country: String,
    /// Display form, always `+`-prefixed.
    pub number: String,
    pub time: DateTime<Utc>,
}

/// A delivered code or message, kept in the bounded match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub time: DateTime<Utc>,
    /// Display form, always `+`-prefixed.
    pub number: String,
    pub code: Option<String>,
    pub client: ClientId,
}

/// A client whose current holding matched a masked number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    pub client: ClientId,
    /// The held number as it was stored in the pool.
    pub number: String,
}

/// Result of an allocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// Fresh numbers, now the client's current holding.
    Issued(Vec<String>),
    /// The pool has no unseen numbers left.
    OutOfStock,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

/// One notification sent (or attempted) for an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub client: ClientId,
    pub number: String,
    pub outcome: DeliveryOutcome,
}

/// Summary of processing one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Masked numbers found in the message.
    pub masked: usize,
    /// Extracted one-time code, if any.
    pub code: Option<String>,
    pub deliveries: Vec<Delivery>,
}

impl DispatchReport {
    /// Number of successful deliveries.
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.outcome == DeliveryOutcome::Delivered)
            .count()
    }

    /// Number of failed deliveries.
    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }
}

/// Available numbers across all countries of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub service: String,
    pub available: usize,
}

/// Stock of one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStock {
    pub key: PoolKey,
    pub stock: StockLevel,
}

/// Per-pool result of an admin bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub key: PoolKey,
    pub result: Result<usize, String>,
}

/// Admin dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub clients: usize,
    pub banned: usize,
    pub admins: usize,
    pub total_numbers: usize,
    pub services: Vec<ServiceTotals>,
    pub top_clients: Vec<TopClient>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTotals {
    pub service: String,
    pub total: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopClient {
    pub client: ClientId,
    pub total: u64,
    pub last_active: Option<DateTime<Utc>>,
}

/// Clients currently holding numbers, plus the latest match events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStatus {
    pub active: Vec<ActiveHolding>,
    /// Most recent first.
    pub recent: Vec<MatchEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveHolding {
    pub client: ClientId,
    pub numbers: usize,
    pub last_active: Option<DateTime<Utc>>,
}
