//! TUI components for kodiscope
//!
//! This crate provides the terminal user interface for kodiscope,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Availability, InputMode, JUMP_SIZE_LIMIT, JumpRequest, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, StatusBar, SummaryOverlay, viewer_hints};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
