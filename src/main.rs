//! pgdash - a PostgreSQL dashboard and query explorer for the terminal.

use std::io::Write;
use std::sync::Arc;

use pgdash::cli::Cli;
use pgdash::config::{self, Config, ConnectionConfig};
use pgdash::db::{ConnectionProvider, LazyConnectionProvider, MockDatabaseClient, StaticProvider};
use pgdash::error::{PgdashError, Result};
use pgdash::query::QueryExecutor;
use pgdash::safety::StatementPolicy;
use pgdash::tui::{self, App};
use pgdash::{export, logging};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e.message());
        eprintln!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(path) = config::load_dotenv(cli.env_file.as_deref())? {
        info!("Loaded environment from {}", path.display());
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let policy = StatementPolicy::from_read_only(cli.read_only || config.explorer.read_only);

    let (connection, provider) = if cli.mock_db {
        info!("Using mock database");
        let connection = ConnectionConfig::from_env_for_display();
        let provider: Arc<dyn ConnectionProvider> =
            Arc::new(StaticProvider::new(MockDatabaseClient::with_sample_catalog()));
        (connection, provider)
    } else {
        let connection = ConnectionConfig::from_env()?;
        let missing = connection.missing_fields();
        if !missing.is_empty() {
            warn!("Missing database settings: {}", missing.join(", "));
        }
        let provider: Arc<dyn ConnectionProvider> =
            Arc::new(LazyConnectionProvider::with_policy(connection.clone(), policy));
        (connection, provider)
    };

    let executor = QueryExecutor::with_policy(provider, policy);

    match &cli.execute {
        Some(sql) => run_headless(&executor, sql, &cli).await,
        None => {
            let app = App::new(
                connection,
                &config.explorer.default_query,
                &config.explorer.export_file,
                policy,
            );
            tui::run(app, executor).await
        }
    }
}

/// Runs one query and writes the result as CSV.
async fn run_headless(executor: &QueryExecutor, sql: &str, cli: &Cli) -> Result<()> {
    let result = executor.execute(sql, &cli.bind_params()).await;
    if let Err(e) = executor.close().await {
        warn!("Error closing database connection: {}", e);
    }
    let result = result?;

    match cli.output_file.as_deref() {
        Some(path) => {
            export::write_csv(&result, path)?;
            info!("{}", result.summary());
            Ok(())
        }
        None => {
            let csv = export::to_csv(&result)?;
            std::io::stdout()
                .write_all(csv.as_bytes())
                .map_err(|e| PgdashError::export(format!("Failed to write to stdout: {e}")))
        }
    }
}
