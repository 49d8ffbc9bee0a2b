//! Database access layer for pgdash.
//!
//! A `DatabaseClient` runs queries over one live session. A
//! `ConnectionProvider` decides when that session is created and hands the
//! shared client to callers, so the UI and tests can swap in fakes.

mod codec;
mod mock;
mod postgres;
mod provider;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use provider::{
    ConnectionProvider, Connector, LazyConnectionProvider, PostgresConnector, StaticProvider,
    UnavailableProvider,
};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// All operations are async and return Results with PgdashError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query with positional bind parameters and returns the
    /// fully materialized result.
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Returns true once the session is closed or was lost.
    async fn is_closed(&self) -> bool {
        false
    }

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
