//! Encoding of the persisted task collection.
//!
//! The data file holds a single pretty-printed JSON array of [`Task`] records
//! in insertion order. The whole array is rewritten on every save.

use crate::task::Task;

/// Error type for collection encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The collection could not be serialized or the document is not a task array.
    #[error("collection json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes the collection as a pretty-printed JSON array (2-space indent).
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn encode_collection(tasks: &[Task]) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Decodes a persisted collection.
///
/// An empty document or a JSON `null` decodes to an empty collection.
///
/// # Errors
///
/// Returns `CodecError::Json` if the document is not a JSON array of tasks.
pub fn decode_collection(raw: &str) -> Result<Vec<Task>, CodecError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tasks: Option<Vec<Task>> = serde_json::from_str(raw)?;
    Ok(tasks.unwrap_or_default())
}
