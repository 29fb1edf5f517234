use std::sync::Arc;

use crate::config::ServerConfig;
use crate::importers::ImporterRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: deckstash_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Importer registry, built once at startup and never mutated.
    pub importers: Arc<ImporterRegistry>,
}
