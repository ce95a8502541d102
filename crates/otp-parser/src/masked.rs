//! Masked phone numbers as they appear in forwarded verification messages.
//!
//! A masked number is a run of digits, then one or more mask glyphs from the
//! circled Latin letter block (U+24B6..=U+24E9), then more digits, e.g.
//! `8801ⒶⒷⒸⒹ5678`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static MASKED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)([\x{24B6}-\x{24E9}]+)([0-9]+)").unwrap());

/// A partially hidden number: visible prefix, hidden digit count, visible suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedNumber {
    pub prefix: String,
    pub hidden_len: usize,
    pub suffix: String,
}

impl MaskedNumber {
    pub fn new(prefix: impl Into<String>, hidden_len: usize, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            hidden_len,
            suffix: suffix.into(),
        }
    }
}

impl fmt::Display for MaskedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.prefix,
            "*".repeat(self.hidden_len),
            self.suffix
        )
    }
}

/// Every masked number in `text`, left to right.
pub fn parse_masked(text: &str) -> Vec<MaskedNumber> {
    MASKED_PATTERN
        .captures_iter(text)
        .map(|caps| MaskedNumber {
            prefix: caps[1].to_string(),
            hidden_len: caps[2].chars().count(),
            suffix: caps[3].to_string(),
        })
        .collect()
}
