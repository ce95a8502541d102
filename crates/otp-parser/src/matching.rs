//! Reconciling masked numbers with real ones.

use crate::masked::MaskedNumber;

/// Strip whitespace, hyphens, `+` and parentheses from a raw number.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '+' | '(' | ')'))
        .collect()
}

/// Display form of a stored number, always with a leading `+`.
pub fn format_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        trimmed.to_string()
    } else {
        format!("+{}", trimmed)
    }
}

impl MaskedNumber {
    /// Whether `raw` is consistent with this masked number.
    ///
    /// The suffix must end the number and the prefix must sit immediately
    /// before exactly `hidden_len` hidden digits. Numbers stored with a
    /// leading trunk zero are also tried without it.
    pub fn matches(&self, raw: &str) -> bool {
        let normalized = normalize(raw);
        let without_trunk = normalized.strip_prefix('0');

        std::iter::once(normalized.as_str())
            .chain(without_trunk)
            .any(|candidate| self.aligns_with(candidate))
    }

    fn aligns_with(&self, candidate: &str) -> bool {
        if !candidate.ends_with(self.suffix.as_str()) {
            return false;
        }

        let Some(prefix_end) = candidate
            .len()
            .checked_sub(self.suffix.len() + self.hidden_len)
        else {
            return false;
        };

        prefix_end >= self.prefix.len()
            && candidate.get(prefix_end - self.prefix.len()..prefix_end) == Some(self.prefix.as_str())
    }
}
