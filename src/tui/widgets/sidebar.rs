//! Sidebar widget for the TUI.
//!
//! Lists the pages and marks the current one.

use crate::tui::app::Page;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Navigation sidebar.
pub struct Sidebar {
    current: Page,
    focused: bool,
}

impl Sidebar {
    pub fn new(current: Page, focused: bool) -> Self {
        Self { current, focused }
    }
}

impl Widget for Sidebar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Navigation ");

        let mut lines: Vec<Line> = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, page)| {
                if *page == self.current {
                    Line::from(Span::styled(
                        format!("▸ {} {}", i + 1, page.title()),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(format!("  {} {}", i + 1, page.title()))
                }
            })
            .collect();

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tab/1-4 switch",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
