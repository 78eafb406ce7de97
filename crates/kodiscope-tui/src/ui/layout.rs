use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Regions of the log viewer screen
pub struct ViewerAreas {
    pub header: Rect,
    pub input_bar: Option<Rect>,
    pub logs: Rect,
    pub status_bar: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, optional input bar, log content and status bar, top to bottom
    pub fn log_viewer(area: Rect, show_input_bar: bool) -> ViewerAreas {
        let mut constraints = vec![Constraint::Length(3)];
        if show_input_bar {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        if show_input_bar {
            ViewerAreas {
                header: chunks[0],
                input_bar: Some(chunks[1]),
                logs: chunks[2],
                status_bar: chunks[3],
            }
        } else {
            ViewerAreas {
                header: chunks[0],
                input_bar: None,
                logs: chunks[1],
                status_bar: chunks[2],
            }
        }
    }

    /// A centered popup of at most `width` x `height`, keeping a 2 cell margin
    pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
