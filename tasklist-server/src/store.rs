//! Persistence backends for the task collection.
//!
//! A [`TaskStore`] loads and saves the *whole* collection at once. There is
//! no partial write: every mutation rewrites everything.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tasklist_proto::codec::{self, CodecError};
use tasklist_proto::task::Task;

/// Errors raised while reading or writing the persisted collection.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The data file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The data file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The collection could not be encoded, or the file contents are not a task array.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Whole-collection load/save contract.
pub trait TaskStore: Send + Sync {
    /// Reads the full collection in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing storage cannot be read or decoded.
    fn load(&self) -> Result<Vec<Task>, StorageError>;

    /// Replaces the full collection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the collection cannot be encoded or written.
    fn save(&self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Collection stored as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Opens the store at `path`, creating an empty collection file (and any
    /// missing parent directories) if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the initial file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self { path: path.into() };
        if !store.path.exists() {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: store.path.clone(),
                    source,
                })?;
            }
            store.save(&[])?;
            tracing::info!(path = %store.path.display(), "created empty task file");
        }
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskStore for FileStore {
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(codec::decode_collection(&raw)?)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let encoded = codec::encode_collection(tasks)?;
        std::fs::write(&self.path, encoded).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-process collection, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }
}

impl TaskStore for MemoryStore {
    fn load(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self.tasks.lock().clone())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        *self.tasks.lock() = tasks.to_vec();
        Ok(())
    }
}
