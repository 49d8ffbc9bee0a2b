//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! over a single sqlx `PgConnection`. There is no pool: callers share the one
//! session and the mutex serializes their queries.
//!
//! Queries without parameters go through the simple query protocol, so a
//! string holding several statements runs as a whole and the last result set
//! is returned. Queries with parameters are prepared first and every
//! parameter is encoded as the type the server inferred for its placeholder.

use crate::config::ConnectionConfig;
use crate::db::codec::{bind_declared, convert_row};
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{PgdashError, Result};
use crate::safety::StatementPolicy;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column as _, Connection, Either, Executor, Row as _, Statement, TypeInfo};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Mutex<Option<PgConnection>>,
}

impl PostgresClient {
    /// Opens one read-write connection using the given configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        Self::connect_with_policy(config, StatementPolicy::Permissive).await
    }

    /// Opens one connection using the given configuration.
    ///
    /// Under [`StatementPolicy::ReadOnly`] the session starts with
    /// `default_transaction_read_only`, so the server refuses writes that slip
    /// past statement classification (side-effecting functions and the like).
    /// Makes a single attempt; failures map to friendly connection errors.
    pub async fn connect_with_policy(
        config: &ConnectionConfig,
        policy: StatementPolicy,
    ) -> Result<Self> {
        let mut options = config.to_connect_options()?;
        if policy == StatementPolicy::ReadOnly {
            options = options.options([("default_transaction_read_only", "on")]);
        }

        debug!("Connecting to {} ({})", config.display_string(), policy);
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;
        debug!("Successfully connected to database");

        Ok(Self::from_connection(conn))
    }

    /// Wraps an already established connection.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| PgdashError::connection("Connection to database is closed"))?;

        let start = Instant::now();

        let fetched = if params.is_empty() {
            fetch_last_result_set(conn, sql).await
        } else {
            fetch_with_params(conn, sql, params).await
        };

        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                if e.is_connection() {
                    // Drop the dead session so the provider reconnects next time.
                    guard.take();
                }
                return Err(e);
            }
        };

        let execution_time = start.elapsed();

        let columns = match rows.first() {
            Some(first_row) if !has_unresolved_types(first_row) => columns_of(first_row),
            first_row => {
                // No rows to read metadata from, or the simple protocol left
                // custom types unnamed; ask the server to describe the statement.
                let described = describe_columns(conn, sql).await;
                match first_row {
                    Some(row) if described.len() != row.len() => columns_of(row),
                    _ => described,
                }
            }
        };

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
        })
    }

    async fn is_closed(&self) -> bool {
        self.conn.lock().await.is_none()
    }

    async fn close(&self) -> Result<()> {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.close()
                .await
                .map_err(|e| PgdashError::connection(format!("Failed to close connection: {e}")))?;
        }
        Ok(())
    }
}

/// Runs `sql` with the simple query protocol and keeps the rows of the last
/// statement.
async fn fetch_last_result_set(conn: &mut PgConnection, sql: &str) -> Result<Vec<PgRow>> {
    let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);
    let mut current = Vec::new();
    let mut last = Vec::new();

    while let Some(item) = stream.try_next().await.map_err(map_query_error)? {
        match item {
            // One completion per statement; its rows came just before it.
            Either::Left(_) => last = std::mem::take(&mut current),
            Either::Right(row) => current.push(row),
        }
    }

    if !current.is_empty() {
        last = current;
    }
    Ok(last)
}

/// Prepares `sql` and binds `params` as the types the server declared.
async fn fetch_with_params(
    conn: &mut PgConnection,
    sql: &str,
    params: &[Value],
) -> Result<Vec<PgRow>> {
    let statement = (&mut *conn).prepare(sql).await.map_err(map_query_error)?;
    let declared = match statement.parameters() {
        Some(Either::Left(types)) => types.to_vec(),
        _ => Vec::new(),
    };

    if declared.len() != params.len() {
        return Err(PgdashError::query(format!(
            "Query expects {} parameter{} but {} {} given",
            declared.len(),
            if declared.len() == 1 { "" } else { "s" },
            params.len(),
            if params.len() == 1 { "was" } else { "were" }
        )));
    }

    let mut query = sqlx::query(sql);
    for (position, (value, type_info)) in params.iter().zip(&declared).enumerate() {
        query = bind_declared(query, value, type_info, position + 1)?;
    }

    query.fetch_all(&mut *conn).await.map_err(map_query_error)
}

fn columns_of(row: &PgRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Custom types in a simple-protocol row description are known only by oid.
fn has_unresolved_types(row: &PgRow) -> bool {
    row.columns()
        .iter()
        .any(|col| col.type_info().name() == "?")
}

/// Fetches column metadata for a statement without executing it again.
///
/// Best effort: statements the server cannot prepare (including strings with
/// several statements) report no columns.
async fn describe_columns(conn: &mut PgConnection, sql: &str) -> Vec<ColumnInfo> {
    match (&mut *conn).prepare(sql).await {
        Ok(statement) => statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect(),
        Err(e) => {
            debug!("Could not describe statement: {}", e);
            Vec::new()
        }
    }
}

/// Maps a failed query to a connection error when the session is gone and a
/// query error otherwise.
fn map_query_error(error: sqlx::Error) -> PgdashError {
    if is_connection_lost(&error) {
        warn!("Database connection lost: {}", error);
        PgdashError::connection(format!("Connection to database was lost: {error}"))
    } else {
        PgdashError::query(format_query_error(error))
    }
}

/// Returns true if the error means the session itself is gone.
fn is_connection_lost(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)
    )
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> PgdashError {
    let host = &config.host;
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        PgdashError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        PgdashError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        PgdashError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        PgdashError::connection(format!("TLS negotiation with {host}:{port} failed: {error}"))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        PgdashError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        PgdashError::connection(error.to_string())
    }
}

/// Formats a query error with PostgreSQL detail and hint when present.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut message = format!("ERROR: {}", db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        let extras = [
            ("DETAIL", pg_error.detail()),
            ("HINT", pg_error.hint()),
            ("TABLE", pg_error.table()),
            ("COLUMN", pg_error.column()),
            ("CONSTRAINT", pg_error.constraint()),
        ];
        for (label, value) in extras {
            if let Some(value) = value {
                message.push_str(&format!("\n  {label}: {value}"));
            }
        }
    }

    message
}
