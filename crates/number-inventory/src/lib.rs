//! Shared number inventory.
//!
//! Each (service, country) pool is an append-only text file of raw numbers.
//! A parallel seen log records every number already handed out, so a number
//! is never given to two clients.

mod error;
mod store;
mod types;

pub use error::InventoryError;
pub use store::{validate_name, Inventory};
pub use types::*;
