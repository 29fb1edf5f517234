use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use deckstash_core::error::CoreError;
use deckstash_core::upload::UploadError;

use crate::importers::ImportError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce the structured
/// problem payload `{ title, status, detail?, errors? }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `deckstash_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A structural problem with an uploaded file.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Request body failed field validation.
    #[error("Request validation failed")]
    Validation(#[from] validator::ValidationErrors),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested import source does not resolve to any importer.
    #[error("Unknown import source: {0}")]
    UnknownSource(String),

    /// The import aborted during remote fetch or persistence.
    #[error("Import failed: {0}")]
    ImportFailed(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Structured problem payload returned for every failure response.
#[derive(Debug, Serialize)]
struct Problem {
    title: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<HashMap<String, Vec<String>>>,
}

impl Problem {
    fn new(status: StatusCode, title: &str, detail: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            status: status.as_u16(),
            detail,
            errors: None,
        }
    }

    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => Problem::new(
                    StatusCode::NOT_FOUND,
                    "Not found",
                    Some(format!("{entity} with id {id} not found")),
                ),
                CoreError::Validation(msg) => {
                    Problem::new(StatusCode::BAD_REQUEST, "Validation failed", Some(msg))
                }
                CoreError::Conflict(msg) => {
                    Problem::new(StatusCode::CONFLICT, "Conflict", Some(msg))
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    Problem::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal error",
                        Some("An internal error occurred".to_string()),
                    )
                }
            },

            // --- Upload structure errors ---
            AppError::Upload(err) => {
                let mut problem = Problem::new(
                    StatusCode::BAD_REQUEST,
                    "Invalid upload",
                    Some(err.to_string()),
                );
                if let Some((field, values)) = err.field_errors() {
                    problem.errors = Some(HashMap::from([(field.to_string(), values)]));
                }
                problem
            }

            // --- Request body validation errors ---
            AppError::Validation(errors) => {
                let mut map: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    map.insert(field.to_string(), messages);
                }
                let mut problem =
                    Problem::new(StatusCode::BAD_REQUEST, "Request validation failed", None);
                problem.errors = Some(map);
                problem
            }

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(&err),

            // --- Import pipeline errors ---
            AppError::UnknownSource(source) => Problem::new(
                StatusCode::BAD_REQUEST,
                "Unknown import source",
                Some(format!("No importer is registered for '{source}'")),
            ),
            AppError::ImportFailed(detail) => {
                tracing::error!(error = %detail, "Import failed");
                Problem::new(
                    StatusCode::BAD_GATEWAY,
                    "Import failed",
                    Some("The source could not be imported".to_string()),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                Problem::new(StatusCode::BAD_REQUEST, "Bad request", Some(msg))
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Problem::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                    Some("An internal error occurred".to_string()),
                )
            }
        }
        .into_response()
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Database(e) => AppError::Database(e),
            ImportError::Remote(e) => AppError::ImportFailed(e.to_string()),
            ImportError::Decode(msg) => AppError::ImportFailed(msg),
            ImportError::Cancelled => AppError::ImportFailed("import was cancelled".to_string()),
        }
    }
}

/// Classify a sqlx error into a problem payload.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Problem {
    match err {
        sqlx::Error::RowNotFound => Problem::new(
            StatusCode::NOT_FOUND,
            "Not found",
            Some("Resource not found".to_string()),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return Problem::new(
                        StatusCode::CONFLICT,
                        "Conflict",
                        Some(format!(
                            "Duplicate value violates unique constraint: {constraint}"
                        )),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
                Some("An internal error occurred".to_string()),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
                Some("An internal error occurred".to_string()),
            )
        }
    }
}
