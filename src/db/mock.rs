//! In-memory database clients for testing and `--mock-db`.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{PgdashError, Result};
use async_trait::async_trait;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns canned results.
///
/// SQL that does not parse fails like a server-side syntax error. Registered
/// queries return their canned result; other queries that produce rows
/// return a single `result` column echoing the SQL.
pub struct MockDatabaseClient {
    canned: HashMap<String, QueryResult>,
    executed: Mutex<Vec<(String, Vec<Value>)>>,
    closed: AtomicBool,
}

impl MockDatabaseClient {
    /// Creates a new mock client with no canned results.
    pub fn new() -> Self {
        Self {
            canned: HashMap::new(),
            executed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a mock client that answers the Data Explorer's default query
    /// with a plausible `information_schema.tables` listing.
    pub fn with_sample_catalog() -> Self {
        let columns = vec![
            ColumnInfo::new("table_catalog", "sql_identifier"),
            ColumnInfo::new("table_schema", "sql_identifier"),
            ColumnInfo::new("table_name", "sql_identifier"),
            ColumnInfo::new("table_type", "character_data"),
        ];
        let rows = [
            ("public", "customers", "BASE TABLE"),
            ("public", "orders", "BASE TABLE"),
            ("public", "order_items", "BASE TABLE"),
            ("public", "monthly_sales", "VIEW"),
            ("pg_catalog", "pg_type", "BASE TABLE"),
        ]
        .into_iter()
        .map(|(schema, name, kind)| {
            vec![
                Value::from("demo"),
                Value::from(schema),
                Value::from(name),
                Value::from(kind),
            ]
        })
        .collect();

        Self::new().with_result(
            "SELECT * FROM information_schema.tables LIMIT 10;",
            QueryResult::with_data(columns, rows),
        )
    }

    /// Registers a canned result for a query.
    ///
    /// Matching ignores case, surrounding whitespace and a trailing semicolon.
    pub fn with_result(mut self, sql: &str, result: QueryResult) -> Self {
        self.canned.insert(normalize(sql), result);
        self
    }

    /// Returns every query executed so far, with its parameters.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PgdashError::connection("Connection to database is closed"));
        }

        if let Ok(mut log) = self.executed.lock() {
            log.push((sql.to_string(), params.to_vec()));
        }

        Parser::parse_sql(&PostgreSqlDialect {}, sql)
            .map_err(|e| PgdashError::query(format!("ERROR: syntax error: {e}")))?;

        if let Some(result) = self.canned.get(&normalize(sql)) {
            return Ok(result.clone().with_execution_time(Duration::from_millis(1)));
        }

        let first_word = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        let result = match first_word.as_str() {
            "SELECT" | "WITH" | "VALUES" | "SHOW" | "EXPLAIN" => QueryResult::with_data(
                vec![ColumnInfo::new("result", "TEXT")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            ),
            _ => QueryResult::new(),
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A client whose every query fails with the given error message.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str, _params: &[Value]) -> Result<QueryResult> {
        Err(PgdashError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn normalize(sql: &str) -> String {
    sql.trim()
        .trim_end_matches(';')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
