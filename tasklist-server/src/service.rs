//! The four task operations over a [`TaskStore`].
//!
//! Every call is a full cycle: load the whole collection, change it in
//! memory, save the whole collection back. A process-wide reader/writer lock
//! makes mutations exclusive, so two concurrent writers cannot lose each
//! other's update and a read never observes a half-written collection.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tasklist_proto::task::{
    CreateTaskRequest, Task, TaskId, TitleError, UpdateTaskRequest, now_millis, validate_title,
};

use crate::store::{StorageError, TaskStore};

/// Errors surfaced by [`TaskService`] operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Caller input was rejected.
    #[error(transparent)]
    Validation(#[from] TitleError),
    /// No task has the referenced id.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The store failed and the policy is [`StoragePolicy::Strict`].
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How storage failures are reported to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoragePolicy {
    /// A failed read behaves like an empty collection; a failed write is
    /// logged and the operation still returns its in-memory result.
    #[default]
    FailOpen,
    /// Read and write failures are returned as [`TaskError::Storage`].
    Strict,
}

/// Task CRUD over a whole-collection store.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    policy: StoragePolicy,
    lock: RwLock<()>,
}

impl TaskService {
    /// Creates a service with the default fail-open storage policy.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self::with_policy(store, StoragePolicy::default())
    }

    /// Creates a service that reports storage failures according to `policy`.
    #[must_use]
    pub fn with_policy(store: Arc<dyn TaskStore>, policy: StoragePolicy) -> Self {
        Self {
            store,
            policy,
            lock: RwLock::new(()),
        }
    }

    /// Returns the full collection in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] only under [`StoragePolicy::Strict`].
    pub fn list(&self) -> Result<Vec<Task>, TaskError> {
        let _guard = self.lock.read();
        self.read()
    }

    /// Creates a task from `request` and appends it to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] if the title is missing or blank, and
    /// [`TaskError::Storage`] on storage failure under the strict policy.
    pub fn create(&self, request: CreateTaskRequest) -> Result<Task, TaskError> {
        let raw = request.title.ok_or(TitleError::Missing)?;
        let title = validate_title(&raw)?;

        let _guard = self.lock.write();
        let mut tasks = self.read()?;

        let mut task = Task::new(title, request.description.unwrap_or_default(), now_millis());
        while tasks.iter().any(|t| t.id == task.id) {
            task.id = TaskId::generate();
        }
        tasks.push(task.clone());
        self.write(&tasks)?;

        tracing::debug!(task_id = %task.id, total = tasks.len(), "task created");
        Ok(task)
    }

    /// Applies the supplied fields of `request` to the task with `id`.
    ///
    /// `updatedAt` is refreshed even when no field is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] for an unknown id,
    /// [`TaskError::Validation`] if a supplied title is blank, and
    /// [`TaskError::Storage`] on storage failure under the strict policy.
    pub fn update(&self, id: &TaskId, request: UpdateTaskRequest) -> Result<Task, TaskError> {
        let _guard = self.lock.write();
        let mut tasks = self.read()?;

        let task = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;

        let title = request.title.as_deref().map(validate_title).transpose()?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = description;
        }
        if let Some(completed) = request.completed {
            task.completed = completed;
        }
        task.updated_at = next_updated_at(task.updated_at, now_millis());
        let updated = task.clone();

        self.write(&tasks)?;

        tracing::debug!(task_id = %id, completed = updated.completed, "task updated");
        Ok(updated)
    }

    /// Removes the task with `id` and returns it as it was before removal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] for an unknown id and
    /// [`TaskError::Storage`] on storage failure under the strict policy.
    pub fn delete(&self, id: &TaskId) -> Result<Task, TaskError> {
        let _guard = self.lock.write();
        let mut tasks = self.read()?;

        let index = tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        let removed = tasks.remove(index);

        self.write(&tasks)?;

        tracing::debug!(task_id = %id, remaining = tasks.len(), "task deleted");
        Ok(removed)
    }

    fn read(&self) -> Result<Vec<Task>, TaskError> {
        match self.store.load() {
            Ok(tasks) => Ok(tasks),
            Err(e) => match self.policy {
                StoragePolicy::FailOpen => {
                    tracing::warn!(error = %e, "failed to read tasks, using empty collection");
                    Ok(Vec::new())
                }
                StoragePolicy::Strict => {
                    tracing::error!(error = %e, "failed to read tasks");
                    Err(e.into())
                }
            },
        }
    }

    fn write(&self, tasks: &[Task]) -> Result<(), TaskError> {
        match self.store.save(tasks) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, count = tasks.len(), "failed to write tasks");
                match self.policy {
                    StoragePolicy::FailOpen => Ok(()),
                    StoragePolicy::Strict => Err(e.into()),
                }
            }
        }
    }
}

/// New `updatedAt`: the current time, but always at least 1ms past `previous`.
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous
        .checked_add_signed(TimeDelta::milliseconds(1))
        .unwrap_or(previous);
    now.max(floor)
}
