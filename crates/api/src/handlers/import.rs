//! Handlers for the catalog import pipeline.
//!
//! Two terminal outcomes per request: a dry-run preview or an applied
//! commit. Which one is fixed by the endpoint, never by the request
//! body, so a caller cannot flip an apply into a dry-run (or the
//! reverse) by body manipulation.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

use deckstash_core::import::{ImportOptions, ImportSummary, DEFAULT_PREVIEW_LIMIT};
use deckstash_core::preview::{build_preview, PreviewReport};
use deckstash_core::source::SourceDescriptor;
use deckstash_core::upload::{validate_upload, ParsedUpload, UploadError};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ── Request shapes ───────────────────────────────────────────────────

/// Fields shared by the JSON body and the multipart form.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ImportRequestBody {
    #[serde(default)]
    #[validate(length(min = 1, message = "source must not be empty"))]
    pub source: String,
    pub set: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "limit must be between 1 and 10000"))]
    pub limit: Option<u32>,
}

/// One parsed import request, either shape.
struct ImportRequest {
    source: String,
    set_code: Option<String>,
    limit: Option<usize>,
    upload: Option<ParsedUpload>,
}

/// Parse the request body by shape: multipart form (file upload) or
/// JSON. Anything else is a request-shape error and terminates the
/// request before any importer logic runs.
async fn read_request(req: Request) -> AppResult<ImportRequest> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        read_multipart_request(req).await
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<ImportRequestBody>::from_request(req, &())
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        body.validate()?;
        Ok(ImportRequest {
            source: body.source,
            set_code: body.set,
            limit: body.limit.map(|l| l as usize),
            upload: None,
        })
    } else {
        Err(AppError::BadRequest(
            "Expected a JSON body or a multipart form".to_string(),
        ))
    }
}

/// Parse a multipart form: text fields `source`, `set`, `limit` plus a
/// required `file` part.
async fn read_multipart_request(req: Request) -> AppResult<ImportRequest> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut body = ImportRequestBody::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "source" => {
                body.source = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "set" => {
                let set = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !set.trim().is_empty() {
                    body.set = Some(set);
                }
            }
            "limit" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                body.limit = Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| AppError::BadRequest(format!("Invalid limit '{raw}'")))?,
                );
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    body.validate()?;

    // A multipart request is by definition a file upload.
    let (filename, data) = file.ok_or(AppError::Upload(UploadError::Missing))?;
    if data.is_empty() {
        return Err(AppError::Upload(UploadError::Empty));
    }
    let limit = body.limit.map(|l| l as usize);
    let upload = validate_upload(&filename, data, limit.unwrap_or(DEFAULT_PREVIEW_LIMIT))?;

    Ok(ImportRequest {
        source: body.source,
        set_code: body.set,
        limit,
        upload: Some(upload),
    })
}

/// Acting-user identity from the upstream-authenticated header.
fn acting_user_id(headers: &HeaderMap) -> Option<i64> {
    headers.get("x-user-id")?.to_str().ok()?.trim().parse().ok()
}

// ── Shared orchestration ─────────────────────────────────────────────

/// Resolve the importer, build options, and run the import. The upload
/// buffer is owned by the request value and dropped on every exit path,
/// including importer failure.
async fn run_import(state: &AppState, req: Request, dry_run: bool) -> AppResult<ImportSummary> {
    let acting_user_id = acting_user_id(req.headers());
    let request = read_request(req).await?;

    let importer = state
        .importers
        .resolve(&request.source)
        .ok_or_else(|| AppError::UnknownSource(request.source.clone()))?;

    let options = ImportOptions {
        dry_run,
        upsert: true,
        limit: request.limit,
        acting_user_id,
        set_code: request.set_code,
    };
    let cancel = CancellationToken::new();

    let run_id = Uuid::now_v7();
    tracing::info!(
        %run_id,
        source = importer.key(),
        dry_run,
        has_file = request.upload.is_some(),
        "Starting import"
    );

    let summary = match &request.upload {
        Some(upload) => {
            importer
                .import_from_file(&state.pool, upload, &options, &cancel)
                .await?
        }
        None => {
            importer
                .import_from_remote(&state.pool, &options, &cancel)
                .await?
        }
    };

    tracing::info!(
        %run_id,
        created = summary.created(),
        updated = summary.updated(),
        errors = summary.errors,
        "Import finished"
    );
    Ok(summary)
}

// ── POST /import/dry-run ─────────────────────────────────────────────

/// Run the reconciliation without persisting anything and return the
/// preview table.
pub async fn dry_run(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Json<PreviewReport>> {
    let summary = run_import(&state, req, true).await?;
    Ok(Json(build_preview(&summary)))
}

// ── POST /import/apply ───────────────────────────────────────────────

/// Result of an applied import.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub invalid: u32,
}

/// Run the same reconciliation as the dry-run and commit it. Applying
/// identical input twice is a no-op the second time.
pub async fn apply(State(state): State<AppState>, req: Request) -> AppResult<Json<ApplyResponse>> {
    let summary = run_import(&state, req, false).await?;
    Ok(Json(ApplyResponse {
        created: summary.created(),
        updated: summary.updated(),
        skipped: 0,
        invalid: summary.errors,
    }))
}

// ── GET /import/options ──────────────────────────────────────────────

/// Static catalog of available sources.
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceDescriptor>,
}

pub async fn options(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.importers.descriptors(),
    })
}
