//! Header widget for the TUI.
//!
//! Displays the application title, version and the connection target.

use crate::safety::StatementPolicy;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

pub const TITLE: &str = "PostgreSQL Dashboard & Reports";

/// Header bar widget.
pub struct Header<'a> {
    connection_info: &'a str,
    policy: StatementPolicy,
}

impl<'a> Header<'a> {
    pub fn new(connection_info: &'a str, policy: StatementPolicy) -> Self {
        Self {
            connection_info,
            policy,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left = format!(" {} v{}", TITLE, env!("CARGO_PKG_VERSION"));
        buf.set_span(area.x, area.y, &Span::styled(left.as_str(), style), area.width);

        let mut right = format!("[db: {}] ", self.connection_info);
        if self.policy == StatementPolicy::ReadOnly {
            right = format!("{} {}", self.policy, right);
        }
        let left_width = left.chars().count() as u16;
        let right_width = right.chars().count() as u16;
        if left_width + right_width < area.width {
            let x = area.right().saturating_sub(right_width);
            buf.set_string(x, area.y, &right, style.add_modifier(Modifier::DIM));
        }
    }
}
