//! Date/time pattern learning.

/// Parse patterns for the three temporal result types, in chrono's
/// `strftime` syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFormats {
    pub date: String,
    pub time: String,
    pub timestamp: String,
}

impl DateFormats {
    /// Translates the literal formats announced by `<datasource>`
    /// (e.g. `MM/dd/yyyy`) into parse patterns (e.g. `%m/%d/%Y`).
    pub fn learn(date: &str, time: &str, timestamp: &str) -> Self {
        Self {
            date: translate(date),
            time: translate(time),
            timestamp: translate(timestamp),
        }
    }
}

/// Applies each token substitution once, in a fixed order.
pub fn translate(format: &str) -> String {
    const TOKENS: [(&str, &str); 6] = [
        ("yyyy", "%Y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];
    TOKENS
        .iter()
        .fold(format.to_string(), |acc, (token, pattern)| acc.replace(token, pattern))
}
