//! Application error types.

use crate::transport::TransportError;
use number_inventory::InventoryError;
use relay_engine::EngineError;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Signal error: {0}")]
    Transport(#[from] TransportError),

    #[error("Relay error: {0}")]
    Engine(#[from] EngineError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
