//! Application state for the TUI.
//!
//! Key handling is synchronous: anything that needs the database comes back
//! to the runner as an [`Action`], and the outcome is fed in again through
//! the `apply_*` methods.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ConnectionConfig;
use crate::dashboard::REPORT_TYPES;
use crate::db::QueryResult;
use crate::error::{PgdashError, Result};
use crate::safety::StatementPolicy;

/// How long a toast stays on screen.
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// The pages listed in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Dashboard,
    DataExplorer,
    Reports,
    Settings,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Dashboard,
        Page::DataExplorer,
        Page::Reports,
        Page::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::DataExplorer => "Data Explorer",
            Self::Reports => "Reports",
            Self::Settings => "Settings",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Maps the number keys `1`-`4` to pages.
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Sidebar,
    Content,
    /// The Data Explorer's result table, scrolled with the arrow keys.
    Results,
}

/// Work the runner has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Execute(String),
    Export,
    TestConnection,
}

/// The Data Explorer's status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success(String),
    Error(String),
}

/// Outcome of the last connection test on the Settings page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Untested,
    Connected,
    Failed(String),
}

/// A transient confirmation message.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }
}

/// Single-line editor state. The cursor is a character index.
#[derive(Debug, Default)]
pub struct InputState {
    pub text: String,
    pub cursor: usize,
}

impl InputState {
    /// Creates an editor holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub page: Page,
    pub focus: Focus,
    /// The Data Explorer's query editor.
    pub input: InputState,
    pub status: Option<Status>,
    /// The most recent successful query result.
    pub last_result: Option<QueryResult>,
    /// Index of the first result row on screen.
    pub result_scroll: usize,
    /// Result rows that fit on screen, recorded while drawing.
    pub result_viewport: Cell<usize>,
    /// Index into [`REPORT_TYPES`].
    pub report_index: usize,
    pub connection: ConnectionConfig,
    pub connection_status: ConnectionStatus,
    pub policy: StatementPolicy,
    pub export_path: PathBuf,
    pub toast: Option<Toast>,
}

impl App {
    pub fn new(
        connection: ConnectionConfig,
        default_query: &str,
        export_path: &Path,
        policy: StatementPolicy,
    ) -> Self {
        Self {
            running: true,
            page: Page::default(),
            focus: Focus::default(),
            input: InputState::with_text(default_query),
            status: None,
            last_result: None,
            result_scroll: 0,
            result_viewport: Cell::new(0),
            report_index: 0,
            connection,
            connection_status: ConnectionStatus::default(),
            policy,
            export_path: export_path.to_path_buf(),
            toast: None,
        }
    }

    /// Returns true when keystrokes go to the query editor.
    pub fn editor_focused(&self) -> bool {
        self.page == Page::DataExplorer && self.focus == Focus::Content
    }

    pub fn report_type(&self) -> &'static str {
        REPORT_TYPES[self.report_index % REPORT_TYPES.len()]
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
        self.focus = if page == Page::DataExplorer {
            Focus::Content
        } else {
            Focus::Sidebar
        };
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    /// Handles a key press and returns the work left for the runner.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                return Action::Quit;
            }
            KeyCode::Char('s') if ctrl && self.page == Page::DataExplorer => {
                return Action::Export;
            }
            KeyCode::Tab => {
                self.set_page(self.page.next());
                return Action::None;
            }
            KeyCode::BackTab => {
                self.set_page(self.page.previous());
                return Action::None;
            }
            _ => {}
        }

        if self.editor_focused() {
            return self.handle_editor_key(key);
        }

        if let Some(page) = match key.code {
            KeyCode::Char(c) => Page::from_digit(c),
            _ => None,
        } {
            self.set_page(page);
            return Action::None;
        }

        if self.page == Page::DataExplorer && self.focus == Focus::Results {
            self.handle_results_key(key);
            return Action::None;
        }

        match (self.page, key.code) {
            (_, KeyCode::Up) if self.focus == Focus::Sidebar => {
                self.page = self.page.previous();
            }
            (_, KeyCode::Down) if self.focus == Focus::Sidebar => {
                self.page = self.page.next();
            }
            (_, KeyCode::Enter) if self.focus == Focus::Sidebar => {
                self.focus = Focus::Content;
            }
            (_, KeyCode::Esc) => {
                self.focus = Focus::Sidebar;
            }
            (Page::Reports, KeyCode::Right) => {
                self.report_index = (self.report_index + 1) % REPORT_TYPES.len();
            }
            (Page::Reports, KeyCode::Left) => {
                self.report_index =
                    (self.report_index + REPORT_TYPES.len() - 1) % REPORT_TYPES.len();
            }
            (Page::Settings, KeyCode::Char('t')) => return Action::TestConnection,
            _ => {}
        }

        Action::None
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                let sql = self.input.text.trim();
                if sql.is_empty() {
                    self.status = Some(Status::Error("Error: query is empty".to_string()));
                    return Action::None;
                }
                return Action::Execute(sql.to_string());
            }
            KeyCode::Esc => self.focus = Focus::Sidebar,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(c)
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Down | KeyCode::PageDown if self.last_result.is_some() => {
                self.focus = Focus::Results;
            }
            _ => {}
        }
        Action::None
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let page = match self.result_viewport.get() {
            0 => 10,
            rows => rows,
        };
        let max = self.max_result_scroll();

        match key.code {
            KeyCode::Up if self.result_scroll == 0 => self.focus = Focus::Content,
            KeyCode::Up => self.result_scroll -= 1,
            KeyCode::Down => self.result_scroll = (self.result_scroll + 1).min(max),
            KeyCode::PageUp => self.result_scroll = self.result_scroll.saturating_sub(page),
            KeyCode::PageDown => self.result_scroll = self.result_scroll.saturating_add(page).min(max),
            KeyCode::Home => self.result_scroll = 0,
            KeyCode::End => self.result_scroll = max,
            KeyCode::Esc | KeyCode::Enter => self.focus = Focus::Content,
            _ => {}
        }
    }

    /// The largest row offset that still fills the visible rows.
    fn max_result_scroll(&self) -> usize {
        let rows = self.last_result.as_ref().map_or(0, |r| r.rows.len());
        rows.saturating_sub(self.result_viewport.get().max(1))
    }

    /// Records the outcome of executing the editor's query.
    pub fn apply_query_result(&mut self, result: Result<QueryResult>) {
        match result {
            Ok(result) => {
                self.status = Some(Status::Success(format!(
                    "Query executed successfully! Rows: {}",
                    result.row_count
                )));
                self.last_result = Some(result);
                self.result_scroll = 0;
            }
            Err(e) => {
                self.status = Some(Status::Error(format!("Error: {e}")));
                self.last_result = None;
                self.result_scroll = 0;
            }
        }
    }

    /// Records the outcome of a CSV export.
    pub fn apply_export_result(&mut self, result: Result<()>) {
        match result {
            Ok(()) => {
                let message = format!("Saved {}", self.export_path.display());
                self.show_toast(message);
            }
            Err(e) => self.status = Some(Status::Error(format!("Error: {e}"))),
        }
    }

    /// Records the outcome of a connection test.
    pub fn apply_connection_test(&mut self, result: Result<()>) {
        match result {
            Ok(()) => {
                self.connection_status = ConnectionStatus::Connected;
                self.show_toast("Connection successful");
            }
            Err(e) => self.connection_status = ConnectionStatus::Failed(e.to_string()),
        }
    }

    /// Returns the result to export, or an error when nothing has run yet.
    pub fn exportable_result(&self) -> Result<&QueryResult> {
        self.last_result
            .as_ref()
            .ok_or_else(|| PgdashError::export("No query results to export"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, Value};

    const DEFAULT_QUERY: &str = "SELECT * FROM information_schema.tables LIMIT 10;";

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn new_app() -> App {
        App::new(
            ConnectionConfig::default(),
            DEFAULT_QUERY,
            Path::new("query_results.csv"),
            StatementPolicy::Permissive,
        )
    }

    #[test]
    fn test_input_insert_and_backspace() {
        let mut input = InputState::default();
        input.insert('h');
        input.insert('i');
        assert_eq!(input.text, "hi");
        assert_eq!(input.cursor, 2);

        input.backspace();
        assert_eq!(input.text, "h");
        input.move_home();
        input.backspace();
        assert_eq!(input.text, "h");
    }

    #[test]
    fn test_input_handles_multibyte_chars() {
        let mut input = InputState::with_text("'é'");
        input.move_left();
        input.backspace();
        assert_eq!(input.text, "''");
        input.insert('ü');
        assert_eq!(input.text, "'ü'");
        input.move_end();
        assert_eq!(input.cursor, 3);
        input.move_right();
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn test_input_delete_at_cursor() {
        let mut input = InputState::with_text("hello");
        input.move_home();
        input.delete();
        assert_eq!(input.text, "ello");
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Dashboard.next(), Page::DataExplorer);
        assert_eq!(Page::Settings.next(), Page::Dashboard);
        assert_eq!(Page::Dashboard.previous(), Page::Settings);
        assert_eq!(Page::from_digit('3'), Some(Page::Reports));
        assert_eq!(Page::from_digit('0'), None);
        assert_eq!(Page::from_digit('5'), None);
    }

    #[test]
    fn test_app_starts_on_dashboard_with_default_query() {
        let app = new_app();
        assert!(app.running);
        assert_eq!(app.page, Page::Dashboard);
        assert_eq!(app.input.text, DEFAULT_QUERY);
        assert_eq!(app.input.cursor, DEFAULT_QUERY.len());
    }

    #[test]
    fn test_number_keys_switch_pages() {
        let mut app = new_app();
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.page, Page::Settings);

        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.page, Page::DataExplorer);
        assert!(app.editor_focused());

        // Typed into the editor, not a page switch.
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.page, Page::DataExplorer);
        assert!(app.input.text.ends_with('1'));
    }

    #[test]
    fn test_enter_in_editor_requests_execution() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Action::Execute(DEFAULT_QUERY.to_string())
        );
    }

    #[test]
    fn test_empty_query_is_not_executed() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        app.handle_key(ctrl('u'));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert!(matches!(app.status, Some(Status::Error(_))));
    }

    #[test]
    fn test_escape_leaves_editor() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.editor_focused());
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.page, Page::Reports);
    }

    #[test]
    fn test_ctrl_s_exports_only_on_explorer() {
        let mut app = new_app();
        assert_eq!(app.handle_key(ctrl('s')), Action::None);
        app.set_page(Page::DataExplorer);
        assert_eq!(app.handle_key(ctrl('s')), Action::Export);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = new_app();
        assert_eq!(app.handle_key(ctrl('q')), Action::Quit);
        assert!(!app.running);

        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
    }

    #[test]
    fn test_report_selection_wraps() {
        let mut app = new_app();
        app.set_page(Page::Reports);
        assert_eq!(app.report_type(), "Sales Report");
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.report_type(), "User Activity");
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.report_type(), "Performance Analysis");
    }

    #[test]
    fn test_settings_t_requests_connection_test() {
        let mut app = new_app();
        app.set_page(Page::Settings);
        assert_eq!(app.handle_key(key(KeyCode::Char('t'))), Action::TestConnection);
    }

    #[test]
    fn test_apply_query_result() {
        let mut app = new_app();
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("a", "INT4")],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );

        app.apply_query_result(Ok(result));
        assert_eq!(
            app.status,
            Some(Status::Success(
                "Query executed successfully! Rows: 2".to_string()
            ))
        );
        assert!(app.exportable_result().is_ok());

        app.apply_query_result(Err(PgdashError::query("ERROR: syntax error")));
        assert_eq!(
            app.status,
            Some(Status::Error(
                "Error: Query error: ERROR: syntax error".to_string()
            ))
        );
        assert!(app.last_result.is_none());
    }

    fn numbered_result(rows: i64) -> QueryResult {
        QueryResult::with_data(
            vec![ColumnInfo::new("n", "INT4")],
            (1..=rows).map(|n| vec![Value::Int(n)]).collect(),
        )
    }

    #[test]
    fn test_results_scroll_with_arrow_and_page_keys() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        app.apply_query_result(Ok(numbered_result(50)));
        app.result_viewport.set(17);

        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.focus, Focus::Results);
        assert_eq!(app.result_scroll, 0);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.result_scroll, 2);

        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.result_scroll, 19);
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.result_scroll, 33);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.result_scroll, 33);

        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.result_scroll, 16);
        app.handle_key(key(KeyCode::Home));
        assert_eq!(app.result_scroll, 0);
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.result_scroll, 33);

        // Typing is not routed to the editor while the table has focus.
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.input.text, DEFAULT_QUERY);

        app.handle_key(key(KeyCode::Home));
        app.handle_key(key(KeyCode::Up));
        assert!(app.editor_focused());
    }

    #[test]
    fn test_new_result_resets_scroll() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        app.apply_query_result(Ok(numbered_result(50)));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::End));
        assert_eq!(app.result_scroll, 49);

        app.handle_key(key(KeyCode::Esc));
        assert!(app.editor_focused());
        app.apply_query_result(Ok(numbered_result(3)));
        assert_eq!(app.result_scroll, 0);
    }

    #[test]
    fn test_down_without_result_stays_in_editor() {
        let mut app = new_app();
        app.set_page(Page::DataExplorer);
        app.handle_key(key(KeyCode::Down));
        assert!(app.editor_focused());
    }

    #[test]
    fn test_export_without_result_fails() {
        let app = new_app();
        let err = app.exportable_result().unwrap_err();
        assert!(matches!(err, PgdashError::Export(_)));
    }

    #[test]
    fn test_connection_test_outcomes() {
        let mut app = new_app();
        app.apply_connection_test(Err(PgdashError::connection("refused")));
        assert_eq!(
            app.connection_status,
            ConnectionStatus::Failed("Connection error: refused".to_string())
        );

        app.apply_connection_test(Ok(()));
        assert_eq!(app.connection_status, ConnectionStatus::Connected);
        assert!(app.toast.is_some());
    }
}
