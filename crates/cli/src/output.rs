use crate::error::CliError;
use engine_runtime::load::LoadSummary;
use serde::Serialize;

/// JSON form of a finished load.
#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows: u64,
    pub batches: u64,
    pub bytes: u64,
    pub table_created: bool,
    pub elapsed_ms: u128,
}

impl From<&LoadSummary> for LoadReport {
    fn from(summary: &LoadSummary) -> Self {
        Self {
            table: summary.table.qualified(),
            rows: summary.rows,
            batches: summary.batches,
            bytes: summary.bytes,
            table_created: summary.table_created,
            elapsed_ms: summary.elapsed.as_millis(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::JsonSerialize)
}

pub async fn write_report<T: Serialize>(value: &T, path: &str) -> Result<(), CliError> {
    let json = to_json(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_report<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", to_json(value)?);
    Ok(())
}

/// Writes to `path` when given, stdout otherwise.
pub async fn emit<T: Serialize>(value: &T, path: Option<&str>) -> Result<(), CliError> {
    match path {
        Some(path) => write_report(value, path).await,
        None => print_report(value),
    }
}
