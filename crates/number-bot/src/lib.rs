//! Signal front end of the number relay.
//!
//! Direct messages are bot commands; messages in the monitor group are
//! matched against the numbers clients hold and forwarded to them.

pub mod commands;
pub mod config;
pub mod error;
pub mod retention;
pub mod router;
pub mod transport;
