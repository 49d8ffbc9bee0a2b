//! Query execution against a live database.

use super::{live_executor, test_connection_config};
use chrono::NaiveDate;
use pgdash::db::{LazyConnectionProvider, Value};
use pgdash::error::PgdashError;
use pgdash::query::QueryExecutor;
use pgdash::safety::StatementPolicy;
use pretty_assertions::assert_eq;
use std::sync::Arc;

macro_rules! live_or_skip {
    () => {
        match live_executor() {
            Some(pair) => pair,
            None => {
                eprintln!("Skipping test: DATABASE_URL not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_select_literals() {
    let (executor, _) = live_or_skip!();

    let result = executor.execute("SELECT 1 AS a, 2 AS b;", &[]).await.unwrap();

    assert_eq!(result.column_names(), vec!["a", "b"]);
    assert_eq!(result.rows, vec![vec![Value::Int(1), Value::Int(2)]]);
    assert_eq!(result.row_count, 1);
}

#[tokio::test]
async fn test_default_explorer_query() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute("SELECT * FROM information_schema.tables LIMIT 10;", &[])
        .await
        .unwrap();

    assert!(result.column_names().contains(&"table_name"));
    assert!(result.row_count <= 10);
    assert!(result.is_rectangular());
}

#[tokio::test]
async fn test_positional_params() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute(
            "SELECT $1::int8 + $2::int8 AS total, $3::text AS label",
            &[Value::Int(40), Value::Int(2), Value::from("answer")],
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows[0],
        vec![Value::Int(42), Value::String("answer".to_string())]
    );
}

#[tokio::test]
async fn test_value_types() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute(
            "SELECT NULL::int AS n, true AS b, 1.50::numeric AS d, 2.5::float8 AS f, \
             DATE '2024-03-01' AS day, '{\"k\": 1}'::jsonb AS j",
            &[],
        )
        .await
        .unwrap();

    let row = &result.rows[0];
    assert_eq!(row[0], Value::Null);
    assert_eq!(row[1], Value::Bool(true));
    assert_eq!(row[2], Value::Decimal("1.50".to_string()));
    assert_eq!(row[3], Value::Float(2.5));
    assert_eq!(
        row[4],
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    );
    assert_eq!(row[5], Value::Json(serde_json::json!({"k": 1})));
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute("SELECT 1 AS a, 'x' AS b WHERE false", &[])
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["a", "b"]);
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let (executor, _) = live_or_skip!();

    let err = executor.execute("SELEC 1", &[]).await.unwrap_err();

    assert!(matches!(err, PgdashError::Query(_)));
    assert!(err.message().contains("syntax error"), "{err}");
}

#[tokio::test]
async fn test_missing_table_is_query_error() {
    let (executor, _) = live_or_skip!();

    let err = executor
        .execute("SELECT * FROM no_such_table_pgdash", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, PgdashError::Query(_)));
    assert!(err.message().contains("does not exist"), "{err}");
}

#[tokio::test]
async fn test_repeated_query_is_stable() {
    let (executor, _) = live_or_skip!();

    let sql = "SELECT g AS n FROM generate_series(1, 5) AS g ORDER BY g";
    let first = executor.execute(sql, &[]).await.unwrap();
    let second = executor.execute(sql, &[]).await.unwrap();

    assert_eq!(first.columns, second.columns);
    assert_eq!(first.rows, second.rows);
}

#[tokio::test]
async fn test_session_is_shared_between_calls() {
    let (executor, provider) = live_or_skip!();

    // Temporary tables only exist in the session that created them.
    executor
        .execute("CREATE TEMP TABLE pgdash_notes (id int, body text)", &[])
        .await
        .unwrap();
    let inserted = executor
        .execute(
            "INSERT INTO pgdash_notes VALUES ($1, $2)",
            &[Value::Int(1), Value::from("hello")],
        )
        .await
        .unwrap();
    assert!(inserted.is_empty());

    let result = executor
        .execute("SELECT id, body FROM pgdash_notes", &[])
        .await
        .unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Int(1), Value::String("hello".to_string())]]
    );
    assert_eq!(provider.sessions_opened(), 1);
}

#[tokio::test]
async fn test_reconnects_after_close() {
    let (executor, provider) = live_or_skip!();

    executor.execute("SELECT 1", &[]).await.unwrap();
    executor.close().await.unwrap();
    executor.execute("SELECT 1", &[]).await.unwrap();

    assert_eq!(provider.sessions_opened(), 2);
}

#[tokio::test]
async fn test_types_without_scalar_decoders_render_like_psql() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute(
            "SELECT interval '1 day' AS i, ARRAY[1,2] AS a, '10.0.0.1'::inet AS addr, \
             1094861636::oid AS o, (SELECT oid FROM pg_class WHERE relname = 'pg_class') AS c, \
             '12:00+02'::timetz AS t",
            &[],
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows[0],
        vec![
            Value::from("1 day"),
            Value::from("{1,2}"),
            Value::from("10.0.0.1"),
            Value::Int(1094861636),
            Value::Int(1259),
            Value::from("12:00:00+02"),
        ]
    );
}

#[tokio::test]
async fn test_binary_values_of_prepared_queries_are_decoded_by_type() {
    let (executor, _) = live_or_skip!();

    // Parameters force the extended protocol, which returns binary values.
    let result = executor
        .execute(
            "SELECT interval '1 day 02:00:00' AS i, ARRAY[1, NULL, 3] AS a, \
             '10.0.0.0/8'::cidr AS net, '::1'::inet AS v6, 1094861636::oid AS o, \
             '12:00+02'::timetz AS t, ARRAY['a b', 'c'] AS words, $1::int AS n",
            &[Value::Int(7)],
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows[0],
        vec![
            Value::from("1 day 02:00:00"),
            Value::from("{1,NULL,3}"),
            Value::from("10.0.0.0/8"),
            Value::from("::1"),
            Value::Int(1094861636),
            Value::from("12:00:00+02"),
            Value::from("{\"a b\",c}"),
            Value::Int(7),
        ]
    );
}

#[tokio::test]
async fn test_multiple_statements_return_last_result_set() {
    let (executor, _) = live_or_skip!();

    let result = executor
        .execute("SELECT 1 AS a; SELECT 2 AS b", &[])
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["b"]);
    assert_eq!(result.rows, vec![vec![Value::Int(2)]]);
}

#[tokio::test]
async fn test_null_param_binds_as_declared_type() {
    let (executor, _) = live_or_skip!();

    executor
        .execute("CREATE TEMP TABLE pgdash_nullable (id int)", &[])
        .await
        .unwrap();
    executor
        .execute("INSERT INTO pgdash_nullable (id) VALUES ($1)", &[Value::Null])
        .await
        .unwrap();

    let result = executor
        .execute("SELECT count(*) AS n FROM pgdash_nullable WHERE id IS NULL", &[])
        .await
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
}

#[tokio::test]
async fn test_text_param_compares_against_date_column() {
    let (executor, _) = live_or_skip!();

    executor
        .execute("CREATE TEMP TABLE pgdash_days (d date)", &[])
        .await
        .unwrap();
    executor
        .execute("INSERT INTO pgdash_days VALUES ('2024-01-01'), ('2024-02-01')", &[])
        .await
        .unwrap();

    let result = executor
        .execute(
            "SELECT d FROM pgdash_days WHERE d = $1",
            &[Value::parse_param("2024-01-01")],
        )
        .await
        .unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())]]
    );
}

#[tokio::test]
async fn test_param_count_mismatch_is_query_error() {
    let (executor, _) = live_or_skip!();

    let err = executor
        .execute("SELECT $1::int AS a, $2::int AS b", &[Value::Int(1)])
        .await
        .unwrap_err();

    assert!(matches!(err, PgdashError::Query(_)));
    assert!(err.message().contains("expects 2 parameters"), "{err}");
}

#[tokio::test]
async fn test_read_only_session_refuses_writes() {
    let Some(config) = test_connection_config() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let provider = Arc::new(LazyConnectionProvider::with_policy(
        config,
        StatementPolicy::ReadOnly,
    ));
    // Permissive classification so the statement reaches the server.
    let executor = QueryExecutor::with_policy(provider, StatementPolicy::Permissive);

    let setting = executor
        .execute("SHOW default_transaction_read_only", &[])
        .await
        .unwrap();
    assert_eq!(setting.rows, vec![vec![Value::from("on")]]);

    let err = executor
        .execute("SELECT 1 AS x INTO pgdash_read_only_copy", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PgdashError::Query(_)));
    assert!(err.message().contains("read-only transaction"), "{err}");
}
