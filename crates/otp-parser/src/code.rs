//! Best-effort one-time code extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tried in order; the first capture wins.
static CODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "OTP: 123456", "code - 1234", "কোড ৫৬৭৮"
        Regex::new(r"(?i)(?:otp|code|verification|pin|কোড)[:\s\-]+(\d{4,8})").unwrap(),
        // "your code is 123456", "কোড হলো 1234"
        Regex::new(r"(?i)(?:is|হলো)\s*[:\-]?\s*(\d{4,8})").unwrap(),
        // any standalone run of 4-8 digits; mask glyphs count as word characters
        Regex::new(r"\b(\d{4,8})\b").unwrap(),
    ]
});

/// Extract a 4 to 8 digit code, preferring labelled forms over bare digits.
///
/// Any Unicode decimal digit counts, so Bengali codes come back as written.
pub fn extract_code(text: &str) -> Option<String> {
    CODE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .map(|caps| caps[1].to_string())
}
