use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Popup showing the last Kodi startup banner
pub struct SummaryOverlay;

impl SummaryOverlay {
    pub fn render(frame: &mut Frame, summary: &str) {
        let area = frame.area();
        let popup_area = Layout::centered_popup(area, area.width, area.height);

        frame.render_widget(Clear, popup_area);

        let lines: Vec<Line> = summary
            .lines()
            .map(|l| Line::from(Span::styled(l, Theme::summary())))
            .collect();

        let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(" System summary ", Theme::title()))
                .title_bottom(Span::styled(" Esc to close ", Theme::text_dim())),
        );

        frame.render_widget(widget, popup_area);
    }
}
