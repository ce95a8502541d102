//! Engine error types.

use crate::types::ClientId;
use number_inventory::InventoryError;
use thiserror::Error;

/// Errors raised by the relay engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Pool or seen storage failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Snapshot I/O failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client is banned.
    #[error("Client is banned: {0}")]
    Banned(ClientId),

    /// The client tried an admin operation.
    #[error("Not an admin: {0}")]
    NotAdmin(ClientId),

    /// The service is not in the configured service list.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Admin input that cannot be applied.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}
