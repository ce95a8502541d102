//! Parsing for inbound verification messages.
//!
//! - [`parse_masked`] finds partially hidden numbers such as `8801ⒶⒷⒸ45678`.
//! - [`extract_code`] pulls the one-time code out of the same text.
//! - [`MaskedNumber::matches`] decides whether a stored number fits a mask.

mod code;
mod masked;
mod matching;

pub use code::extract_code;
pub use masked::{parse_masked, MaskedNumber};
pub use matching::{format_number, normalize};
