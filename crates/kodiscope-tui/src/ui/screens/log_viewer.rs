use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthChar;

use kodiscope_logs::{CompiledFilter, LogBuffer};
use kodiscope_types::{LogLevel, LogLine};

use crate::app::{AppState, Availability, InputMode};
use crate::ui::components::{StatusBar, viewer_hints};
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, log_buffer: &LogBuffer) {
        let show_input_bar = state.ui_state.input_mode.is_some() || !state.query.is_empty();
        let areas = Layout::log_viewer(frame.area(), show_input_bar);

        Self::render_header(frame, areas.header, state);
        if let Some(area) = areas.input_bar {
            Self::render_input_bar(frame, area, state);
        }
        Self::render_logs(frame, areas.logs, state, log_buffer);
        Self::render_status_bar(frame, areas.status_bar, state, log_buffer);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let path = state
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "no file ([o] to open)".to_string());
        let mode = if state.full_load { "FULL" } else { "TAIL" };

        let mut spans = vec![
            Span::styled("kodiscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(path, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(mode, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(" ALL ", Theme::toggle(state.levels.is_all())),
        ];
        for level in LogLevel::SELECTABLE {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!(" {} ", level.as_str()),
                Theme::toggle(state.levels.is_selected(level)),
            ));
        }

        spans.push(Span::styled(" │ ", Theme::text_dim()));
        match &state.keyword_list {
            Some(name) => spans.push(Span::styled(
                format!("list: {} ({})", name, state.keywords.len()),
                Theme::text_highlight(),
            )),
            None => spans.push(Span::styled("list: none", Theme::text_dim())),
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_input_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![];

        let (title, text) = match state.ui_state.input_mode {
            Some(InputMode::Search) => {
                spans.push(Span::styled(" /", Theme::text_highlight()));
                (" Search ", state.ui_state.input.as_str())
            }
            Some(InputMode::OpenPath) => {
                spans.push(Span::styled(" Open: ", Theme::text_highlight()));
                (" Open file ", state.ui_state.input.as_str())
            }
            None => {
                spans.push(Span::styled(" Search: ", Theme::text_dim()));
                (" Search ", state.query.as_str())
            }
        };

        spans.push(Span::styled(text.to_string(), Theme::text_highlight()));

        let active = state.ui_state.input_mode.is_some();
        if active {
            spans.push(Span::styled("█", Theme::text_highlight()));
            spans.push(Span::styled("  [Enter] Apply  [Esc] Cancel", Theme::text_dim()));
        } else {
            spans.push(Span::styled("  [/] Edit  [x] Reset", Theme::text_dim()));
        }

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if active {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, log_buffer: &LogBuffer) {
        let total = log_buffer.len();

        // Visible area inside the border
        let inner_height = area.height.saturating_sub(2) as usize;

        // Follow mode pins the view to the bottom
        if state.ui_state.auto_scroll {
            state.ui_state.log_scroll = total.saturating_sub(inner_height);
        }

        let max_scroll = total.saturating_sub(inner_height);
        if state.ui_state.log_scroll > max_scroll {
            state.ui_state.log_scroll = max_scroll;
        }

        // 2 for borders, 1 for scrollbar
        let inner_width = area.width.saturating_sub(3) as usize;

        let top = state.ui_state.log_scroll;
        let focused = (!state.ui_state.auto_scroll).then_some(top);
        let lines: Vec<Line> = log_buffer
            .range(top, inner_height)
            .iter()
            .enumerate()
            .map(|(offset, line)| {
                let rendered = format_log_line(line, &state.highlighter, inner_width);
                let index = Some(top + offset);
                if index == state.ui_state.jump_highlight {
                    rendered.style(Theme::jump_highlight())
                } else if index == focused {
                    rendered.style(Theme::focused_line())
                } else {
                    rendered
                }
            })
            .collect();

        let mut title = vec![Span::styled(format!(" Logs ({total}) "), Theme::title())];
        if state.paused {
            title.push(Span::styled(" PAUSED ", Theme::warning()));
        }

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Line::from(title)),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.ui_state.log_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, log_buffer: &LogBuffer) {
        let mut bar = StatusBar::new().hints(viewer_hints());

        if let Some(message) = &state.ui_state.message {
            bar = bar.right(format!("{message} │ "), Theme::status_bar_key());
        }

        let counts = log_buffer.level_counts();
        let summary: Vec<String> = LogLevel::SELECTABLE
            .iter()
            .rev()
            .map(|level| format!("{}:{}", &level.as_str()[..1], counts.get(*level)))
            .collect();
        bar = bar.right(summary.join(" "), Theme::status_bar());

        if let Some(stats) = &state.file_stats {
            bar = bar.right(
                format!(" │ {} │ {} lines", stats.human_size(), stats.lines),
                Theme::status_bar(),
            );
        }

        let (marker, style) = availability_marker(&state.availability);
        bar = bar.right(" │ ", Theme::status_bar());
        bar = bar.right(marker, style);

        let follow = if state.paused {
            " ⏸"
        } else if state.ui_state.auto_scroll {
            " ▼"
        } else {
            "  "
        };
        bar = bar.right(follow, Theme::status_bar());

        frame.render_widget(bar, area);
    }
}

fn availability_marker(availability: &Availability) -> (String, Style) {
    let bar = Theme::status_bar();
    match availability {
        Availability::Idle => ("idle".to_string(), bar),
        Availability::Live => ("live".to_string(), bar.patch(Theme::success())),
        Availability::Unavailable(reason) => (format!("unavailable: {reason}"), bar.patch(Theme::warning())),
        Availability::Ended => ("file gone".to_string(), bar.patch(Theme::error())),
        Availability::Failed(error) => (format!("failed: {error}"), bar.patch(Theme::error())),
    }
}

/// Render one log line: level tag, separator, then the message with keyword hits
fn format_log_line(line: &LogLine, highlighter: &CompiledFilter, width: usize) -> Line<'static> {
    // " XXX │ " = 7 cells
    const PREFIX_WIDTH: usize = 7;

    let mut spans = vec![
        Span::styled(format!(" {:>3}", line.level.as_str()), Theme::level_tag(line.level)),
        Span::styled(" │ ", Theme::text_dim()),
    ];

    let (message, truncated) = truncate_to_width(&line.text, width.saturating_sub(PREFIX_WIDTH));
    let matches = highlighter.find_matches(message);
    spans.extend(highlight_spans(
        message,
        &matches,
        Theme::level_text(line.level),
        Theme::keyword_match(),
    ));
    if truncated {
        spans.push(Span::styled("…", Theme::text_dim()));
    }

    Line::from(spans)
}

/// Longest prefix of `text` that fits in `width` cells
///
/// When the text does not fit, one cell is kept free for an ellipsis.
fn truncate_to_width(text: &str, width: usize) -> (&str, bool) {
    let mut used = 0;
    let mut cut = None;
    for (i, c) in text.char_indices() {
        let w = c.width().unwrap_or(0);
        if cut.is_none() && used + w > width.saturating_sub(1) {
            cut = Some(i);
        }
        used += w;
        if used > width {
            return (&text[..cut.unwrap_or(i)], true);
        }
    }
    (text, false)
}

/// Split `text` into spans, styling the given byte ranges as matches
fn highlight_spans(
    text: &str,
    matches: &[(usize, usize)],
    base: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for &(start, end) in matches {
        if start < last_end || end > text.len() {
            continue;
        }
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), highlight));
        last_end = end;
    }

    if last_end < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }

    spans
}
