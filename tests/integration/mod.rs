//! Integration tests for pgdash.

pub mod connection_test;
pub mod export_test;
pub mod headless_test;
pub mod query_test;

use pgdash::config::ConnectionConfig;
use pgdash::db::LazyConnectionProvider;
use pgdash::query::QueryExecutor;
use std::sync::Arc;

/// Returns the connection settings from `DATABASE_URL`, if set.
pub fn test_connection_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut config = ConnectionConfig::from_connection_string(&url).ok()?;
    // Trust-authenticated test servers take URLs without a password.
    config.password.get_or_insert_with(String::new);
    Some(config)
}

/// Returns an executor over a lazily opened live connection.
pub fn live_executor() -> Option<(QueryExecutor, Arc<LazyConnectionProvider>)> {
    let config = test_connection_config()?;
    let provider = Arc::new(LazyConnectionProvider::new(config));
    Some((QueryExecutor::new(provider.clone()), provider))
}
