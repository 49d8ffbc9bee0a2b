//! Terminal user interface for pgdash.
//!
//! Provides the main loop using ratatui and crossterm. Database work is
//! awaited inline, so a slow query holds the screen until it finishes.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{Event, EventHandler};

use crate::error::{PgdashError, Result};
use crate::export;
use crate::query::QueryExecutor;
use app::Action;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tracing::{info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: Self::setup_terminal()?,
            event_handler: EventHandler::new(),
        })
    }

    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| PgdashError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            PgdashError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| PgdashError::internal(format!("Failed to create terminal: {e}")))
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| PgdashError::internal(format!("Failed to disable raw mode: {e}")))?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            PgdashError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;
        self.terminal
            .show_cursor()
            .map_err(|e| PgdashError::internal(format!("Failed to show cursor: {e}")))
    }

    /// Runs the event loop until the user quits, then closes the connection.
    pub async fn run(&mut self, mut app: App, executor: QueryExecutor) -> Result<()> {
        let hook = TerminalPanicHook::install();

        let result = self.event_loop(&mut app, &executor).await;

        if let Err(e) = executor.close().await {
            warn!("Error closing database connection: {}", e);
        }
        drop(hook);

        result
    }

    async fn event_loop(&mut self, app: &mut App, executor: &QueryExecutor) -> Result<()> {
        while app.running {
            app.clear_expired_toast();

            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| PgdashError::internal(format!("Failed to draw: {e}")))?;

            let handler = self.event_handler;
            let event = tokio::task::spawn_blocking(move || handler.next())
                .await
                .map_err(|e| PgdashError::internal(format!("Event task failed: {e}")))??;

            if let Event::Key(key) = event {
                let action = app.handle_key(key);
                perform(action, app, executor).await;
            }
        }

        info!("Shutting down");
        Ok(())
    }
}

type PanicHook = Box<dyn Fn(&panic::PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Leaves the alternate screen before a panic message is printed, then
/// defers to the hook that was installed before it.
///
/// Dropping it reinstates that previous hook.
struct TerminalPanicHook {
    previous: Arc<PanicHook>,
}

impl TerminalPanicHook {
    fn install() -> Self {
        let previous = Arc::new(panic::take_hook());
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            chained(panic_info);
        }));
        Self { previous }
    }
}

impl Drop for TerminalPanicHook {
    fn drop(&mut self) {
        let previous = Arc::clone(&self.previous);
        // Replaces the terminal hook, which holds the other reference.
        drop(panic::take_hook());
        panic::set_hook(Box::new(move |panic_info| previous(panic_info)));
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Carries out an action returned by [`App::handle_key`].
pub async fn perform(action: Action, app: &mut App, executor: &QueryExecutor) {
    match action {
        Action::None | Action::Quit => {}
        Action::Execute(sql) => {
            let result = executor.execute(&sql, &[]).await;
            app.apply_query_result(result);
        }
        Action::Export => {
            let result = app
                .exportable_result()
                .and_then(|result| export::write_csv(result, &app.export_path));
            app.apply_export_result(result);
        }
        Action::TestConnection => {
            let result = executor.test_connection().await;
            app.apply_connection_test(result);
        }
    }
}

/// Runs the TUI until the user quits.
pub async fn run(app: App, executor: QueryExecutor) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(app, executor).await
}
