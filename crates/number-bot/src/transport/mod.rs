//! Signal chat transport.

mod client;
mod error;
mod receiver;
mod types;

pub use client::SignalClient;
pub use error::TransportError;
pub use receiver::MessageReceiver;
pub use types::*;
