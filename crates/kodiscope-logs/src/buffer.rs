use std::collections::VecDeque;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;

use kodiscope_types::{LogLevel, LogLine};

/// Default number of lines kept for display
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Thread-safe ring buffer of displayed log lines
#[derive(Clone)]
pub struct LogBuffer {
    lines: Arc<RwLock<VecDeque<LogLine>>>,

    /// Maximum capacity
    capacity: usize,
}

impl LogBuffer {
    /// Create a new log buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)))),
            capacity,
        }
    }

    /// Push a line, evicting the oldest if at capacity
    pub fn push(&self, line: LogLine) {
        let mut lines = self.lines.write();
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Push a batch of lines in order under a single lock
    pub fn extend(&self, batch: impl IntoIterator<Item = LogLine>) {
        let mut lines = self.lines.write();
        for line in batch {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Line at `index`, oldest first
    pub fn get(&self, index: usize) -> Option<LogLine> {
        self.lines.read().get(index).cloned()
    }

    /// Index of the first line stamped with `timestamp`
    pub fn position_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.lines
            .read()
            .iter()
            .position(|l| l.timestamp == Some(timestamp))
    }

    /// Get line count per level
    pub fn level_counts(&self) -> LevelCounts {
        let lines = self.lines.read();
        let mut counts = LevelCounts::default();

        for line in lines.iter() {
            match line.level {
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Info => counts.info += 1,
                LogLevel::Warning => counts.warning += 1,
                LogLevel::Error => counts.error += 1,
                LogLevel::Unclassified => counts.unclassified += 1,
            }
        }

        counts
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// Export all lines as text, one per line
    pub fn export_raw(&self) -> String {
        let lines = self.lines.read();
        let mut out = String::new();
        for line in lines.iter() {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    /// Clear all lines
    pub fn clear(&self) {
        self.lines.write().clear();
    }

    /// Get lines in a range (for virtual scrolling)
    pub fn range(&self, start: usize, count: usize) -> Vec<LogLine> {
        let lines = self.lines.read();
        lines.iter().skip(start).take(count).cloned().collect()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Counts per level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub unclassified: usize,
}

impl LevelCounts {
    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warning => self.warning,
            LogLevel::Error => self.error,
            LogLevel::Unclassified => self.unclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, level: LogLevel) -> LogLine {
        LogLine::new(text, level)
    }

    fn texts(buffer: &LogBuffer) -> Vec<String> {
        buffer.range(0, buffer.len()).into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let buffer = LogBuffer::new(2);
        buffer.push(line("one", LogLevel::Info));
        buffer.push(line("two", LogLevel::Info));
        buffer.push(line("three", LogLevel::Info));

        assert_eq!(texts(&buffer), vec!["two", "three"]);
    }

    #[test]
    fn test_extend_keeps_order() {
        let buffer = LogBuffer::new(3);
        buffer.extend((0..5).map(|i| line(&format!("l{i}"), LogLevel::Debug)));

        assert_eq!(texts(&buffer), vec!["l2", "l3", "l4"]);
    }

    #[test]
    fn test_level_counts() {
        let buffer = LogBuffer::default();
        buffer.push(line("a", LogLevel::Error));
        buffer.push(line("b", LogLevel::Error));
        buffer.push(line("c", LogLevel::Warning));
        buffer.push(line("d", LogLevel::Unclassified));

        let counts = buffer.level_counts();
        assert_eq!(counts.error, 2);
        assert_eq!(counts.get(LogLevel::Warning), 1);
        assert_eq!(counts.unclassified, 1);
        assert_eq!(counts.get(LogLevel::Unclassified), 1);
    }

    #[test]
    fn test_export_and_clear() {
        let buffer = LogBuffer::default();
        buffer.push(line("first", LogLevel::Info));
        buffer.push(line("second", LogLevel::Info));
        assert_eq!(buffer.export_raw(), "first\nsecond\n");

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.export_raw(), "");
    }

    #[test]
    fn test_range_and_get() {
        let buffer = LogBuffer::default();
        buffer.extend((0..10).map(|i| line(&i.to_string(), LogLevel::Info)));

        let range: Vec<_> = buffer.range(3, 2).into_iter().map(|l| l.text).collect();
        assert_eq!(range, vec!["3", "4"]);
        assert_eq!(buffer.get(9).map(|l| l.text), Some("9".to_string()));
        assert_eq!(buffer.get(10), None);
    }

    #[test]
    fn test_position_of_timestamp() {
        let stamp = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f").unwrap();
        let at = |text: &str, ts: &str| LogLine {
            timestamp: Some(stamp(ts)),
            ..line(text, LogLevel::Info)
        };

        let buffer = LogBuffer::default();
        buffer.push(line("banner", LogLevel::Unclassified));
        buffer.push(at("first", "2024-01-01 10:00:01.000"));
        buffer.push(at("second", "2024-01-01 10:00:01.000"));
        buffer.push(at("third", "2024-01-01 10:00:02.500"));

        assert_eq!(buffer.position_of(stamp("2024-01-01 10:00:01.000")), Some(1));
        assert_eq!(buffer.position_of(stamp("2024-01-01 10:00:02.500")), Some(3));
        assert_eq!(buffer.position_of(stamp("2024-01-01 09:00:00.000")), None);
    }
}
