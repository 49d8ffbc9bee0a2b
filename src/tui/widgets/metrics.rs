//! Metric cards for the Dashboard page.

use crate::dashboard::Metric;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// A row of equally sized metric cards.
pub struct MetricCards<'a> {
    metrics: &'a [Metric],
}

impl<'a> MetricCards<'a> {
    pub fn new(metrics: &'a [Metric]) -> Self {
        Self { metrics }
    }
}

impl Widget for MetricCards<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.metrics.is_empty() {
            return;
        }

        let constraints = vec![Constraint::Ratio(1, self.metrics.len() as u32); self.metrics.len()];
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (metric, cell) in self.metrics.iter().zip(cells.iter()) {
            let delta_color = if metric.is_up() {
                Color::Green
            } else {
                Color::Red
            };
            let arrow = if metric.is_up() { "↑" } else { "↓" };

            let lines = vec![
                Line::from(Span::styled(
                    metric.value,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{arrow} {}", metric.delta),
                    Style::default().fg(delta_color),
                )),
            ];

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", metric.label));

            Paragraph::new(lines).block(block).render(*cell, buf);
        }
    }
}
