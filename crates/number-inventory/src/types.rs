//! Pool identifiers and stock counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one number pool: a country inside a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    pub service: String,
    pub country: String,
}

impl PoolKey {
    pub fn new(service: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} › {}", self.service, self.country)
    }
}

/// Stock counters for a single pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    /// Raw entries in the pool file (duplicates included).
    pub total: usize,
    /// Distinct pool numbers already handed out.
    pub used: usize,
    /// Distinct pool numbers still available.
    pub available: usize,
}

impl StockLevel {
    pub fn tier(&self) -> StockTier {
        StockTier::from_available(self.available)
    }
}

/// Coarse availability bucket used by stock screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTier {
    /// More than ten numbers left.
    Plenty,
    /// Between one and ten numbers left.
    Low,
    /// Nothing left.
    Empty,
}

impl StockTier {
    pub fn from_available(available: usize) -> Self {
        match available {
            0 => StockTier::Empty,
            1..=10 => StockTier::Low,
            _ => StockTier::Plenty,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            StockTier::Plenty => "🟢",
            StockTier::Low => "🟡",
            StockTier::Empty => "🔴",
        }
    }
}
