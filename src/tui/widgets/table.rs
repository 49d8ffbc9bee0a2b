//! Result table widget for the TUI.
//!
//! Renders a [`QueryResult`] as a box-drawn grid. Query results and the
//! static sample tables share this widget. When the rows do not fit, a
//! window of them is drawn starting at the row offset, and the borders and
//! summary stay on screen.

use crate::db::{QueryResult, Value};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

const MAX_COLUMN_WIDTH: usize = 40;
const MIN_COLUMN_WIDTH: usize = 4;

// Top border, header, separator and bottom border.
const FRAME_LINES: usize = 4;

/// Widget for rendering a query result as a table.
pub struct ResultTable<'a> {
    result: &'a QueryResult,
    show_summary: bool,
    row_offset: usize,
}

impl<'a> ResultTable<'a> {
    pub fn new(result: &'a QueryResult) -> Self {
        Self {
            result,
            show_summary: true,
            row_offset: 0,
        }
    }

    /// Starts the visible rows at `row_offset`.
    pub fn scrolled(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    /// Number of data rows that fit in `height` lines.
    pub fn body_rows(height: u16, show_summary: bool) -> usize {
        (height as usize)
            .saturating_sub(FRAME_LINES + usize::from(show_summary))
            .max(1)
    }

    /// Hides the "N rows returned" line under the grid.
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    fn calculate_column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .result
            .columns
            .iter()
            .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        for row in &self.result.rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }

        widths
            .into_iter()
            .map(|w| w.min(MAX_COLUMN_WIDTH))
            .collect()
    }

    /// Fits the natural widths into `available` columns of terminal space.
    fn fit_widths(widths: Vec<usize>, available: usize) -> Vec<usize> {
        // Each column adds two spaces of padding and one separator.
        let total: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        if total <= available || available == 0 {
            return widths;
        }
        let scale = available as f64 / total as f64;
        widths
            .into_iter()
            .map(|w| ((w as f64 * scale) as usize).max(MIN_COLUMN_WIDTH))
            .collect()
    }

    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let kept: String = s.chars().take(max_width - 3).collect();
            format!("{kept}...")
        }
    }

    /// Renders the table to lines for embedding in other widgets.
    pub fn render_to_lines(&self, available_width: usize) -> Vec<Line<'a>> {
        self.render_rows(available_width, usize::MAX)
    }

    /// Renders at most `max_rows` data rows, starting at the row offset.
    fn render_rows(&self, available_width: usize, max_rows: usize) -> Vec<Line<'a>> {
        if self.result.columns.is_empty() {
            return vec![Line::from(Span::styled(
                "(no columns returned)",
                Style::default().fg(Color::DarkGray),
            ))];
        }

        let widths = Self::fit_widths(self.calculate_column_widths(), available_width);

        let total = self.result.rows.len();
        let visible = max_rows.min(total);
        let offset = self.row_offset.min(total - visible);

        let mut lines = Vec::with_capacity(visible + FRAME_LINES + 1);
        lines.push(Self::border(&widths, '┌', '┬', '┐'));
        lines.push(self.header_row(&widths));
        lines.push(Self::border(&widths, '├', '┼', '┤'));
        for row in &self.result.rows[offset..offset + visible] {
            lines.push(Self::data_row(row, &widths));
        }
        lines.push(Self::border(&widths, '└', '┴', '┘'));

        if self.show_summary {
            let mut summary = self.result.summary();
            if visible < total {
                summary.push_str(&format!(" · rows {}-{}", offset + 1, offset + visible));
            }
            lines.push(Line::from(Span::styled(
                summary,
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines
    }

    fn border(widths: &[usize], left: char, mid: char, right: char) -> Line<'a> {
        let inner = widths
            .iter()
            .map(|w| "─".repeat(w + 2))
            .collect::<Vec<_>>()
            .join(&mid.to_string());
        Line::from(Span::styled(
            format!("{left}{inner}{right}"),
            Style::default().fg(Color::DarkGray),
        ))
    }

    fn header_row(&self, widths: &[usize]) -> Line<'a> {
        let names = self.result.columns.iter().map(|c| c.name.as_str());
        let style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        Self::row_line(names.map(|n| (n.to_string(), style)), widths)
    }

    fn data_row(row: &[Value], widths: &[usize]) -> Line<'a> {
        let cells = row.iter().map(|value| {
            let style = if value.is_null() {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };
            (value.to_display_string(), style)
        });
        Self::row_line(cells, widths)
    }

    fn row_line(cells: impl Iterator<Item = (String, Style)>, widths: &[usize]) -> Line<'a> {
        let separator = Style::default().fg(Color::DarkGray);
        let mut spans = vec![Span::styled("│", separator)];

        for (i, (text, style)) in cells.enumerate() {
            let width = widths.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
            let text = Self::truncate(&text, width);
            let pad = width.saturating_sub(text.chars().count());
            spans.push(Span::styled(format!(" {text}{} ", " ".repeat(pad)), style));
            spans.push(Span::styled("│", separator));
        }

        Line::from(spans)
    }
}

impl Widget for ResultTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let max_rows = Self::body_rows(area.height, self.show_summary);
        let lines = self.render_rows(area.width as usize, max_rows);

        for (line, y) in lines.iter().zip(area.top()..area.bottom()) {
            buf.set_line(area.x, y, line, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;
    use std::time::Duration;

    fn sample_result() -> QueryResult {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("id", "INT4"),
                ColumnInfo::new("name", "TEXT"),
                ColumnInfo::new("email", "TEXT"),
            ],
            vec![
                vec![
                    Value::Int(1),
                    Value::from("Alice"),
                    Value::from("alice@test.com"),
                ],
                vec![Value::Int(2), Value::from("Bob"), Value::Null],
            ],
        )
        .with_execution_time(Duration::from_millis(23))
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_calculate_column_widths() {
        let result = sample_result();
        let widths = ResultTable::new(&result).calculate_column_widths();

        // "id" is padded up to the minimum; "email" grows to fit the address.
        assert_eq!(widths, vec![4, 5, 14]);
    }

    #[test]
    fn test_widths_count_chars_not_bytes() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("city", "TEXT")],
            vec![vec![Value::from("Zürich")]],
        );
        assert_eq!(ResultTable::new(&result).calculate_column_widths(), vec![6]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(ResultTable::truncate("hello", 10), "hello");
        assert_eq!(ResultTable::truncate("hello world", 8), "hello...");
        assert_eq!(ResultTable::truncate("hello", 3), "hel");
        assert_eq!(ResultTable::truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_render_to_lines() {
        let result = sample_result();
        let lines = ResultTable::new(&result).render_to_lines(80);

        // Top border, header, separator, 2 rows, bottom border, summary.
        assert_eq!(lines.len(), 7);
        assert_eq!(line_text(&lines[1]), "│ id   │ name  │ email          │");
        assert_eq!(line_text(&lines[4]), "│ 2    │ Bob   │ NULL           │");
        assert_eq!(line_text(&lines[6]), "2 rows returned (23ms)");
    }

    #[test]
    fn test_without_summary() {
        let result = sample_result();
        let lines = ResultTable::new(&result)
            .without_summary()
            .render_to_lines(80);
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_scrolled_window_keeps_frame_and_summary() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("n", "INT4")],
            (1..=10).map(|n| vec![Value::Int(n)]).collect(),
        );

        let lines = ResultTable::new(&result).scrolled(4).render_rows(80, 3);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts.len(), 8);
        assert_eq!(texts[3], "│ 5    │");
        assert_eq!(texts[5], "│ 7    │");
        assert!(texts[6].starts_with('└'));
        assert!(texts[7].ends_with("· rows 5-7"), "{}", texts[7]);

        // Offsets past the end show the last full window.
        let lines = ResultTable::new(&result).scrolled(100).render_rows(80, 3);
        assert_eq!(line_text(&lines[3]), "│ 8    │");
        assert!(line_text(&lines[7]).ends_with("· rows 8-10"));
    }

    #[test]
    fn test_body_rows() {
        assert_eq!(ResultTable::body_rows(22, true), 17);
        assert_eq!(ResultTable::body_rows(22, false), 18);
        assert_eq!(ResultTable::body_rows(2, true), 1);
    }

    #[test]
    fn test_no_columns() {
        let result = QueryResult::new();
        let lines = ResultTable::new(&result).render_to_lines(80);
        assert_eq!(lines.len(), 1);
    }
}
