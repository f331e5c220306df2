//! Shared contract for the tasklist HTTP API and its persisted data file.

pub mod codec;
pub mod task;
