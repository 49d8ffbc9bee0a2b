//! UI rendering for the TUI.
//!
//! Header, sidebar and footer frame the current page.

use super::app::{App, ConnectionStatus, Focus, Page, Status};
use super::widgets::{header, input, metrics, sidebar, table, toast};
use crate::dashboard;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const FOOTER: &str = "© 2024 pgdash";

const SIDEBAR_WIDTH: u16 = 22;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
        .split(rows[1]);

    let connection_info = app.connection.display_string();
    frame.render_widget(header::Header::new(&connection_info, app.policy), rows[0]);
    frame.render_widget(
        sidebar::Sidebar::new(app.page, app.focus == Focus::Sidebar),
        columns[0],
    );
    render_page(frame, columns[1], app);
    render_footer(frame, rows[2]);

    if let Some(t) = &app.toast {
        frame.render_widget(toast::Toast::new(&t.message), toast::Toast::area(area));
    }
}

fn render_page(frame: &mut Frame, area: Rect, app: &App) {
    let border_style = if app.focus != Focus::Sidebar {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", app.page.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.page {
        Page::Dashboard => render_dashboard(frame, inner),
        Page::DataExplorer => render_explorer(frame, inner, app),
        Page::Reports => render_reports(frame, inner, app),
        Page::Settings => render_settings(frame, inner, app),
    }
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn render_dashboard(frame: &mut Frame, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(heading("Dashboard Overview")), parts[0]);
    let metrics = dashboard::metrics();
    frame.render_widget(metrics::MetricCards::new(&metrics), parts[1]);
    frame.render_widget(Paragraph::new(heading("Sample Data Trend")), parts[2]);
    let trend = dashboard::monthly_trend();
    frame.render_widget(table::ResultTable::new(&trend).without_summary(), parts[3]);
}

fn render_explorer(frame: &mut Frame, area: Rect, app: &App) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    let focused = app.editor_focused();
    frame.render_widget(
        input::EditorBar::new(&app.input.text, app.input.cursor, focused),
        parts[0],
    );
    if focused {
        let skip = input::calculate_scroll_offset(
            app.input.cursor,
            input::EditorBar::available_width(parts[0]),
        );
        let x = parts[0].x + input::TEXT_OFFSET + (app.input.cursor - skip) as u16;
        frame.set_cursor_position((x, parts[0].y + 1));
    }

    let status = match &app.status {
        Some(Status::Success(msg)) => Line::from(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Green),
        )),
        Some(Status::Error(msg)) => Line::from(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Press Enter to execute the query",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(status), parts[1]);

    if let Some(result) = &app.last_result {
        app.result_viewport
            .set(table::ResultTable::body_rows(parts[2].height, true));
        frame.render_widget(
            table::ResultTable::new(result).scrolled(app.result_scroll),
            parts[2],
        );
    }
}

fn render_reports(frame: &mut Frame, area: Rect, app: &App) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let selector = Line::from(vec![
        Span::raw("Select Report Type: "),
        Span::styled(
            format!("◂ {} ▸", app.report_type()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  (←/→)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(selector), parts[0]);

    let title = dashboard::report_heading(app.report_type());
    frame.render_widget(Paragraph::new(heading(&title)), parts[1]);

    let report = dashboard::quarterly_report();
    frame.render_widget(table::ResultTable::new(&report).without_summary(), parts[2]);
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App) {
    let config = &app.connection;
    let label = Style::default().fg(Color::DarkGray);
    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("{name:<10}"), label), Span::raw(value)])
    };
    let unset = || "(not set)".to_string();

    let test_line = match &app.connection_status {
        ConnectionStatus::Untested => Line::from(Span::styled(
            "Press t to test the connection",
            Style::default().fg(Color::DarkGray),
        )),
        ConnectionStatus::Connected => Line::from(Span::styled(
            "Connection successful",
            Style::default().fg(Color::Green),
        )),
        ConnectionStatus::Failed(msg) => Line::from(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Red),
        )),
    };

    let lines = vec![
        heading("Database Configuration"),
        Line::from(Span::styled(
            "Database connection settings can be configured via .env file",
            Style::default().fg(Color::Blue),
        )),
        Line::default(),
        field("Host", config.host.clone()),
        field("Port", config.port.to_string()),
        field("Database", config.database.clone().unwrap_or_else(unset)),
        field("User", config.user.clone().unwrap_or_else(unset)),
        field("Password", config.masked_password()),
        field("Mode", app.policy.to_string()),
        Line::default(),
        test_line,
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(FOOTER, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(line).centered(), area);
}
