//! GameStash library — game inventory HTTP API.
//!
//! This crate provides the components for running a small game-inventory
//! service: request handling, a pluggable game-record store, and
//! pluggable object storage for uploaded cover images.

use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod inventory;
pub mod metrics;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::inventory::store::GameStore;
use crate::storage::backend::ObjectStorage;

/// Shared application state passed to all handlers via `axum::extract::State`.
///
/// The store and storage handles are injected here rather than living in
/// module-wide singletons, so tests can run against in-memory fakes.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Game-record store (SQLite or in-memory).
    pub store: Arc<dyn GameStore>,
    /// Object storage for uploaded images (AWS gateway or local filesystem).
    pub storage: Arc<dyn ObjectStorage>,
}
