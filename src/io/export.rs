//! JSON export of chart payloads.
//!
//! The payloads already use the field names JS charting libraries expect
//! (`labels`, `datasets`, `borderColor`, ...), so a front end can load them as-is.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

/// Serialize any chart payload to pretty JSON.
pub fn to_json<T: Serialize>(payload: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(payload)
        .map_err(|e| AppError::new(4, format!("Failed to serialize chart JSON: {e}")))
}

/// Write any chart payload to `path` as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, payload)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export '{}': {e}", path.display())))?;

    Ok(())
}
