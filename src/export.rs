//! CSV export of query results.

use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::info;

use crate::db::{QueryResult, Value};
use crate::error::{PgdashError, Result};

/// Renders a result as CSV text: a header of column names, then one record
/// per row. NULL becomes an empty field.
pub fn to_csv(result: &QueryResult) -> Result<String> {
    let mut buffer = Vec::new();
    write_records(result, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| PgdashError::export(e.to_string()))
}

/// Writes a result as CSV to `path`, replacing any existing file.
pub fn write_csv(result: &QueryResult, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| PgdashError::export(format!("Cannot write {}: {}", path.display(), e)))?;
    write_records(result, file)?;
    info!("Exported {} row(s) to {}", result.row_count, path.display());
    Ok(())
}

fn write_records<W: Write>(result: &QueryResult, output: W) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output);

    writer.write_record(result.column_names())?;
    for row in &result.rows {
        writer.write_record(row.iter().map(csv_field))?;
    }
    writer
        .flush()
        .map_err(|e| PgdashError::export(e.to_string()))
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_display_string(),
    }
}
