//! CSV export through the query boundary, using the mock database.

use pgdash::db::{ColumnInfo, MockDatabaseClient, QueryResult, StaticProvider, Value};
use pgdash::export::{to_csv, write_csv};
use pgdash::query::QueryExecutor;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn executor() -> QueryExecutor {
    let mock = MockDatabaseClient::new().with_result(
        "SELECT id, name, note FROM customers",
        QueryResult::with_data(
            vec![
                ColumnInfo::new("id", "INT4"),
                ColumnInfo::new("name", "TEXT"),
                ColumnInfo::new("note", "TEXT"),
            ],
            vec![
                vec![Value::Int(1), Value::from("Ada"), Value::Null],
                vec![Value::Int(2), Value::from("Lin, Grace"), Value::from("vip")],
            ],
        ),
    );
    QueryExecutor::new(Arc::new(StaticProvider::new(mock)))
}

#[tokio::test]
async fn test_export_matches_executed_result() -> anyhow::Result<()> {
    let result = executor()
        .execute("SELECT id, name, note FROM customers", &[])
        .await?;

    let csv = to_csv(&result)?;

    assert_eq!(csv, "id,name,note\n1,Ada,\n2,\"Lin, Grace\",vip\n");
    Ok(())
}

#[tokio::test]
async fn test_export_to_file_overwrites() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("query_results.csv");
    std::fs::write(&path, "stale contents that are much longer than the export\n")?;

    let result = executor()
        .execute("SELECT id, name, note FROM customers", &[])
        .await?;
    write_csv(&result, &path)?;

    let written = std::fs::read_to_string(&path)?;
    assert_eq!(written.lines().count(), result.row_count + 1);
    assert!(written.starts_with("id,name,note\n"));
    Ok(())
}
