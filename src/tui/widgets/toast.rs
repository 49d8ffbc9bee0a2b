//! Toast notification widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Toast notification widget.
pub struct Toast<'a> {
    message: &'a str,
}

impl<'a> Toast<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// The toast's area, anchored above the footer in the bottom-right corner.
    pub fn area(screen: Rect) -> Rect {
        let width = 44.min(screen.width.saturating_sub(4));
        let height = 3.min(screen.height);
        let x = screen.x + screen.width.saturating_sub(width + 2);
        let y = screen.y + screen.height.saturating_sub(height + 1);
        Rect::new(x, y, width, height)
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(area);
        block.render(area, buf);

        let max_len = inner.width as usize;
        let message = if self.message.chars().count() > max_len {
            let kept: String = self.message.chars().take(max_len.saturating_sub(1)).collect();
            format!("{kept}…")
        } else {
            self.message.to_string()
        };

        Paragraph::new(Span::styled(
            message,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_area_is_bottom_right() {
        let area = Toast::area(Rect::new(0, 0, 80, 24));
        assert_eq!(area, Rect::new(34, 20, 44, 3));
    }

    #[test]
    fn test_long_message_is_truncated() {
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        Toast::new("Saved query_results.csv").render(area, &mut buf);

        let row: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains("Saved que…"));
    }
}
