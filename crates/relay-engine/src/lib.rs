//! Allocation and reconciliation engine for shared verification numbers.
//!
//! [`RelayEngine`] hands out unseen numbers from the inventory, remembers
//! each client's latest batch, and routes inbound masked-number messages to
//! the clients whose batch fits the mask.

pub mod admin;
mod engine;
mod error;
pub mod notify;
pub mod state;
mod store;
mod types;

pub use admin::{AdminOutcome, PendingAdminAction};
pub use engine::{RelayDefaults, RelayEngine, MAX_NUMBER_LIMIT};
pub use error::EngineError;
pub use notify::{compose_notification, DeliveryError, Notifier};
pub use state::RelaySnapshot;
pub use store::{FileStore, SnapshotStore};
pub use types::*;
