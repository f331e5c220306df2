//! Task model and request bodies for the tasklist JSON API.
//!
//! A [`Task`] serializes with camelCase keys and ISO 8601 UTC timestamps at
//! millisecond precision, which is both the HTTP response shape and the
//! element shape of the persisted collection file.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier of a task.
///
/// Newly created tasks get a UUID v7 string. Identifiers read back from the
/// data file are accepted verbatim, whatever their format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh, time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Immutable identifier assigned at creation.
    pub id: TaskId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Free-form description, empty when not provided.
    #[serde(default)]
    pub description: String,
    /// Completion flag, `false` at creation.
    #[serde(default)]
    pub completed: bool,
    /// Creation time, never changes.
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    /// Time of the last successful mutation (creation counts).
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new open task with a fresh id and both timestamps set to `now`.
    ///
    /// `title` is expected to be validated already (see [`validate_title`]).
    #[must_use]
    pub fn new(title: String, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::generate(),
            title,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time truncated to the millisecond precision used on the wire.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Body of `POST /api/tasks`.
///
/// `title` is optional at the type level so that a missing title is reported
/// as a validation failure rather than a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PUT /api/tasks/{id}`. Absent (or `null`) fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// JSON body returned with every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Reasons a task title is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    /// No title was supplied.
    #[error("task title is required")]
    Missing,
    /// The title is empty after trimming whitespace.
    #[error("task title cannot be empty")]
    Empty,
}

/// Trims `raw` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns [`TitleError::Empty`] if `raw` is empty or whitespace only.
pub fn validate_title(raw: &str) -> Result<String, TitleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TitleError::Empty);
    }
    Ok(trimmed.to_string())
}

/// ISO 8601 (RFC 3339) timestamps as produced by JavaScript's
/// `Date.prototype.toISOString`, e.g. `2024-05-01T12:00:00.000Z`.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
