use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::centered_popup(frame.area(), 52, 37);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Filters"),
            Self::key_line("a", "Show all levels"),
            Self::key_line("1 2 3 4", "Toggle debug/info/warning/error"),
            Self::key_line("/", "Search (case-insensitive)"),
            Self::key_line("k / K", "Next / previous keyword list"),
            Self::key_line("x", "Reset all filters"),
            Line::from(""),
            Self::section("File"),
            Self::key_line("o", "Open log file"),
            Self::key_line("l", "Toggle full file / tail"),
            Self::key_line("m", "Show system summary"),
            Self::key_line("e", "Export view to file"),
            Line::from(""),
            Self::section("View"),
            Self::key_line("f", "Pause / follow"),
            Self::key_line("c", "Clear view"),
            Self::key_line("Enter", "Open line in the unfiltered file"),
            Self::key_line("j/↓", "Scroll down"),
            Self::key_line("↑", "Scroll up"),
            Self::key_line("Ctrl+d", "Page down"),
            Self::key_line("Ctrl+u", "Page up"),
            Self::key_line("g", "Go to top"),
            Self::key_line("G", "Go to bottom"),
            Line::from(""),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Close overlay"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
