//! Tasklist server library.
//!
//! Exposes the task store, service, and HTTP router for use in tests and
//! embedding. The server keeps the whole task collection in one JSON file
//! and rewrites it on every mutation.

pub mod config;
pub mod http;
pub mod service;
pub mod store;
