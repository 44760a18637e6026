pub mod diff;
pub mod parse;

use crate::error::AppError;

/// Read a source file, naming the path on failure.
fn read_source(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| AppError::io_at(format!("{path}: {e}"), path).to_string())
}

/// Serialize a value as pretty-printed JSON.
fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::from(e).to_string())
}
