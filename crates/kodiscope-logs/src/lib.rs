//! Log processing for kodiscope
//!
//! This crate provides Kodi log tailing, classification, filtering,
//! de-duplication and buffering.

mod buffer;
mod error;
mod filter;
pub mod keywords;
mod monitor;
mod parser;
mod recency;
mod stats;
pub mod summary;
mod tailer;

pub use buffer::{DEFAULT_CAPACITY, LevelCounts, LogBuffer};
pub use error::TailError;
pub use filter::CompiledFilter;
pub use monitor::{MonitorConfig, POLL_INTERVAL, RETRY_BACKOFF, SessionRequest, TailEvent, TailMonitor};
pub use parser::LogParser;
pub use recency::{DEDUP_CAPACITY, RecencyCache};
pub use stats::{FileStats, human_size};
pub use tailer::{PollOutcome, TAIL_LINES, TailOptions, Tailer, WINDOW_BYTES};

// Re-export types used in our public API
pub use kodiscope_types::{FilterSpec, LevelSelection, LogLevel, LogLine};
