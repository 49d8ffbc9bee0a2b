//! The query execution boundary.
//!
//! Obtains the shared client from a [`ConnectionProvider`], applies the
//! statement policy and runs the query. Failures are logged and returned as
//! values; nothing here retries.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::db::{ConnectionProvider, QueryResult, Value};
use crate::error::{PgdashError, Result};
use crate::safety::{classify_sql, SafetyLevel, StatementPolicy};

/// Query used by the connection test on the Settings page.
const PING_SQL: &str = "SELECT 1";

/// Executes queries against the shared connection.
#[derive(Clone)]
pub struct QueryExecutor {
    provider: Arc<dyn ConnectionProvider>,
    policy: StatementPolicy,
}

impl QueryExecutor {
    /// Creates an executor that lets every statement through.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self::with_policy(provider, StatementPolicy::default())
    }

    /// Creates an executor with an explicit statement policy.
    pub fn with_policy(provider: Arc<dyn ConnectionProvider>, policy: StatementPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> StatementPolicy {
        self.policy
    }

    /// Executes a query with positional `$n` parameters.
    ///
    /// Returns a `Connection` error when no client can be obtained and a
    /// `Query` error when the statement is refused or fails on the server.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let result = self.run(sql, params).await;
        if let Err(e) = &result {
            error!("{}: {}", e.category(), e);
        }
        result
    }

    /// Opens the connection if needed and runs a trivial query.
    ///
    /// Bypasses the statement policy.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.provider.client().await?;
        client.execute_query(PING_SQL, &[]).await.map(|_| ())
    }

    /// Closes the shared connection. The next query reconnects.
    pub async fn close(&self) -> Result<()> {
        self.provider.close().await
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let client = self.provider.client().await?;

        let classification = classify_sql(sql);
        if !self.policy.allows(&classification) {
            return Err(PgdashError::query(format!(
                "{} statements are not allowed in {} mode",
                classification.statement_type, self.policy
            )));
        }
        if classification.level != SafetyLevel::Safe {
            warn!(
                "Executing {} statement ({})",
                classification.statement_type, classification.level
            );
        }

        debug!("Executing query with {} parameter(s): {}", params.len(), sql);
        let start = Instant::now();
        let result = client.execute_query(sql, params).await?;
        let elapsed = start.elapsed();
        debug!("Query returned {} row(s) in {:?}", result.row_count, elapsed);

        Ok(result.with_execution_time(elapsed))
    }
}
