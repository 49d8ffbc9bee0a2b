//! Query editor widget for the TUI.
//!
//! A single bordered line with a prompt, scrolled so the cursor stays visible.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Border (1) + prompt "> " (2).
pub const TEXT_OFFSET: u16 = 3;

/// Returns how many characters to skip so the cursor fits in `available_width`.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Query editor widget.
pub struct EditorBar<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
}

impl<'a> EditorBar<'a> {
    pub fn new(text: &'a str, cursor: usize, focused: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
        }
    }

    /// Width available for text inside `area`, leaving room for the cursor.
    pub fn available_width(area: Rect) -> usize {
        area.width.saturating_sub(TEXT_OFFSET + 2) as usize
    }
}

impl Widget for EditorBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let title = if self.focused {
            " Enter SQL Query (Enter run · Ctrl+S export · Esc leave) "
        } else {
            " Enter SQL Query "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        let skip = calculate_scroll_offset(self.cursor, Self::available_width(area));
        let visible: String = self.text.chars().skip(skip).collect();

        let line = Line::from(vec![
            Span::styled(
                "> ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(visible),
        ]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}
