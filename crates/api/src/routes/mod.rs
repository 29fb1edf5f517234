pub mod health;
pub mod import;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /import/dry-run    POST   preview an import without persisting
/// /import/apply      POST   run the same import and commit it
/// /import/options    GET    static catalog of available sources
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/import", import::router())
}
