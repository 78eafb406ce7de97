use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Status bar showing keyboard hints on the left and state on the right
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right: Vec<Span<'a>>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Append a styled segment to the right side
    pub fn right(mut self, text: impl Into<String>, style: Style) -> Self {
        self.right.push(Span::styled(text.into(), style));
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let right = Line::from(self.right);
        let right_width = right.width() as u16;

        // Right side wins when space is short
        let right_x = area.x + area.width.saturating_sub(right_width + 1);
        buf.set_line(right_x.max(area.x), area.y, &right, area.width);

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{key}]"), Theme::status_bar_key()));
            spans.push(Span::styled(desc.to_string(), Theme::status_bar()));
        }
        let left = Line::from(spans);

        let left_room = right_x.saturating_sub(area.x + 2);
        if left_room > 0 {
            buf.set_line(area.x + 1, area.y, &left, left_room);
        }
    }
}

/// Default hints for the log viewer
pub fn viewer_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("a/1-4", "Levels"),
        ("/", "Search"),
        ("k", "Keywords"),
        ("o", "Open"),
        ("f", "Follow"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_right_text_is_right_aligned() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new()
            .hints([("q", "Quit")])
            .right("12 lines", Theme::status_bar())
            .render(area, &mut buf);

        let text = row(&buf, 40);
        assert!(text.starts_with(" [q]Quit"));
        assert!(text.ends_with("12 lines "));
    }

    #[test]
    fn test_hints_yield_to_right_text() {
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new()
            .hints(viewer_hints())
            .right("E:1 W:2 I:3 D:4", Theme::status_bar())
            .render(area, &mut buf);

        assert!(row(&buf, 20).ends_with("E:1 W:2 I:3 D:4 "));
    }
}
