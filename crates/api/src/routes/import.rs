//! Route definitions for the catalog import pipeline.
//!
//! Mounted at `/import`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST   /dry-run   -> import::dry_run   (JSON or multipart)
/// POST   /apply     -> import::apply     (JSON or multipart)
/// GET    /options   -> import::options
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dry-run", post(import::dry_run))
        .route("/apply", post(import::apply))
        .route("/options", get(import::options))
}
