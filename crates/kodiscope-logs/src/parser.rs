use chrono::NaiveDateTime;

use kodiscope_types::{LogLevel, LogLine};

/// Spaced severity tokens, checked in this order
const LEVEL_TOKENS: [(&str, LogLevel); 4] = [
    (" error ", LogLevel::Error),
    (" warning ", LogLevel::Warning),
    (" info ", LogLevel::Info),
    (" debug ", LogLevel::Debug),
];

/// Kodi timestamp prefix: `2024-01-15 10:30:00.123` (23 chars)
const TIMESTAMP_LEN: usize = 23;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Log parser for Kodi log lines
pub struct LogParser;

impl LogParser {
    /// Parse a raw line (terminator optional) into a LogLine
    pub fn parse(raw: &str) -> LogLine {
        let text = raw.trim_end_matches(['\n', '\r']);
        LogLine {
            text: text.to_string(),
            level: Self::classify(text),
            timestamp: Self::extract_timestamp(text),
        }
    }

    /// Detect severity from space-delimited tokens
    ///
    /// Only `" error "`, `" warning "`, `" info "` and `" debug "` count. A
    /// token at the very start or end of the line has no surrounding spaces
    /// and leaves the line unclassified.
    pub fn classify(text: &str) -> LogLevel {
        let lower = text.to_lowercase();
        LEVEL_TOKENS
            .iter()
            .find(|(token, _)| lower.contains(*token))
            .map(|(_, level)| *level)
            .unwrap_or(LogLevel::Unclassified)
    }

    /// Extract the timestamp Kodi writes at the start of every line
    pub fn extract_timestamp(text: &str) -> Option<NaiveDateTime> {
        let prefix = text.get(..TIMESTAMP_LEN)?;
        NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()
    }
}
