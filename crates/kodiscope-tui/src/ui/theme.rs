use ratatui::style::{Color, Modifier, Style};

use kodiscope_types::LogLevel;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    /// Startup banner text
    pub const SUMMARY: Color = Color::Cyan;

    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::HIGHLIGHT)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Body text of a log line
    pub fn level_text(level: LogLevel) -> Style {
        Style::default().fg(level.color())
    }

    /// The short level tag in front of a line
    pub fn level_tag(level: LogLevel) -> Style {
        Style::default()
            .fg(level.color())
            .add_modifier(Modifier::BOLD)
    }

    /// Keyword hit inside a log line
    pub fn keyword_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Level toggle in the header, on or off
    pub fn toggle(on: bool) -> Style {
        if on {
            Style::default()
                .fg(Self::BG)
                .bg(Self::PRIMARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Self::text_dim()
        }
    }

    /// Top line while scrolled back, where a jump starts from
    pub fn focused_line() -> Style {
        Style::default().bg(Color::Indexed(236))
    }

    /// Line a jump landed on
    pub fn jump_highlight() -> Style {
        Style::default()
            .bg(Color::Indexed(58))
            .add_modifier(Modifier::BOLD)
    }

    pub fn summary() -> Style {
        Style::default().fg(Self::SUMMARY)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default()
            .fg(Self::WARNING)
            .add_modifier(Modifier::BOLD)
    }
}
