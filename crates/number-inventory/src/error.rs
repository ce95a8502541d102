//! Inventory storage errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    /// Service or country name that cannot be used as a file name.
    #[error("Invalid pool name: {0:?}")]
    InvalidName(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}
