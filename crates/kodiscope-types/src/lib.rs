//! Shared types for kodiscope
//!
//! This crate contains data structures used across multiple kodiscope crates.

use chrono::NaiveDateTime;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
///
/// Kodi writes `debug`, `info`, `warning` and `error` lines. Anything the
/// classifier cannot place is `Unclassified`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Unclassified,
}

impl LogLevel {
    /// Levels the user can select in a filter, in toolbar order
    pub const SELECTABLE: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
    ];

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Debug => Color::Gray,
            Self::Info => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
            Self::Unclassified => Color::White,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Unclassified => "   ",
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

/// A single line produced by the tailer
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    /// Line text without its terminator
    pub text: String,

    /// Detected severity
    pub level: LogLevel,

    /// Kodi timestamp prefix (if present)
    pub timestamp: Option<NaiveDateTime>,
}

impl LogLine {
    /// Create a line with no timestamp
    pub fn new(text: impl Into<String>, level: LogLevel) -> Self {
        Self {
            text: text.into(),
            level,
            timestamp: None,
        }
    }
}

// ============================================================================
// Filter Types
// ============================================================================

/// Severity half of a filter
///
/// An empty set means "all". Deselecting the last specific level therefore
/// re-activates "all", and selecting "all" clears every specific level.
///
/// Stored as a plain list of level names. Loading goes through
/// [`LevelSelection::only`], so an `unclassified` entry is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LogLevel>", into = "Vec<LogLevel>")]
pub struct LevelSelection {
    levels: BTreeSet<LogLevel>,
}

impl LevelSelection {
    /// Selection that lets every level through
    pub fn all() -> Self {
        Self::default()
    }

    /// Selection restricted to the given levels (unclassified is ignored)
    pub fn only<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = LogLevel>,
    {
        Self {
            levels: levels.into_iter().filter(LogLevel::is_classified).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.levels.is_empty()
    }

    /// Is this specific level switched on? Always false while "all" is active.
    pub fn is_selected(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Does a line of this level pass the selection?
    pub fn allows(&self, level: LogLevel) -> bool {
        self.is_all() || self.levels.contains(&level)
    }

    /// Flip a specific level on or off
    pub fn toggle(&mut self, level: LogLevel) {
        if !level.is_classified() {
            return;
        }
        if !self.levels.remove(&level) {
            self.levels.insert(level);
        }
    }

    /// Switch back to "all"
    pub fn select_all(&mut self) {
        self.levels.clear();
    }

    /// Selected levels in toolbar order
    pub fn levels(&self) -> impl Iterator<Item = LogLevel> + '_ {
        self.levels.iter().copied()
    }
}

impl From<Vec<LogLevel>> for LevelSelection {
    fn from(levels: Vec<LogLevel>) -> Self {
        Self::only(levels)
    }
}

impl From<LevelSelection> for Vec<LogLevel> {
    fn from(selection: LevelSelection) -> Self {
        selection.levels().collect()
    }
}

/// The active line predicate as configured by the user
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Severity selection
    pub levels: LevelSelection,

    /// Case-insensitive substring query (empty = no restriction)
    pub query: String,

    /// Keyword allow-list (empty = no restriction)
    pub keywords: Vec<String>,
}

impl FilterSpec {
    /// Filter that lets every non-blank line through
    pub fn pass_all() -> Self {
        Self::default()
    }

    pub fn with_levels(mut self, levels: LevelSelection) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Check if filter restricts nothing
    pub fn is_empty(&self) -> bool {
        self.levels.is_all() && self.query.is_empty() && self.keywords.is_empty()
    }
}
