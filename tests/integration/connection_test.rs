//! Connection provider behaviour without a reachable database.

use super::live_executor;
use pgdash::config::ConnectionConfig;
use pgdash::db::{ConnectionProvider, LazyConnectionProvider};
use pgdash::query::QueryExecutor;
use std::sync::Arc;

fn unreachable_config() -> ConnectionConfig {
    ConnectionConfig {
        host: "127.0.0.1".to_string(),
        // Nothing listens on port 1.
        port: 1,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
    }
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let provider = LazyConnectionProvider::new(unreachable_config());

    let err = provider.client().await.err().unwrap();

    assert!(err.is_connection(), "{err}");
    assert_eq!(provider.sessions_opened(), 0);
}

#[tokio::test]
async fn test_failed_connect_is_retried_on_next_call() {
    let provider = Arc::new(LazyConnectionProvider::new(unreachable_config()));
    let executor = QueryExecutor::new(provider.clone());

    for _ in 0..2 {
        let err = executor.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(err.is_connection());
    }
    assert_eq!(provider.sessions_opened(), 0);
}

#[tokio::test]
async fn test_missing_settings_never_connect() {
    let config = ConnectionConfig::from_lookup(|key| match key {
        "DB_HOST" => Some("db.example.invalid".to_string()),
        _ => None,
    })
    .unwrap();
    let executor = QueryExecutor::new(Arc::new(LazyConnectionProvider::new(config)));

    let err = executor.execute("SELECT 1", &[]).await.unwrap_err();

    assert!(err.is_connection());
    assert!(err.message().contains("DB_NAME"), "{err}");
    assert!(err.message().contains("DB_USER"), "{err}");
}

#[tokio::test]
async fn test_connection_check_against_live_database() {
    let Some((executor, provider)) = live_executor() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    executor.test_connection().await.unwrap();
    executor.test_connection().await.unwrap();

    assert_eq!(provider.sessions_opened(), 1);
    provider.close().await.unwrap();
}
