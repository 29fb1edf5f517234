//! Structural validation for uploaded catalog files.
//!
//! Two encodings are supported: delimited text (CSV) and an
//! array-of-objects JSON document. Validation here is structural only;
//! per-row semantics are an importer responsibility. The whole upload
//! is buffered in memory so importers can re-read it from position
//! zero, and the buffer is released by ownership on every exit path.

use std::io::Cursor;

use crate::import::CandidateRecord;

/// Header columns every delimited upload must carry.
pub const REQUIRED_CSV_COLUMNS: &[&str] = &["name", "set", "number"];

// ── Content kind ─────────────────────────────────────────────────────

/// Detected content kind of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Json,
}

impl UploadKind {
    /// MIME-like content kind reported to callers.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// Detect the kind from a file name's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext)?;
        match extension.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────

/// Structural validation failure for an upload. Every variant maps to a
/// client-facing 400-class response, never silently downgraded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("No file was provided")]
    Missing,

    #[error("Unsupported file extension on '{0}' (expected .csv or .json)")]
    UnsupportedExtension(String),

    #[error("The uploaded file is empty")]
    Empty,

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Malformed delimited data: {0}")]
    MalformedCsv(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("The root JSON value must be an array")]
    NotAnArray,

    #[error("Element {index} is not an object")]
    ElementNotObject { index: usize },

    #[error("Element {index} is missing required field {field}")]
    MissingField { index: usize, field: &'static str },
}

impl UploadError {
    /// Field-keyed detail for errors the parser can localize, shaped
    /// for the problem payload's `errors` map.
    pub fn field_errors(&self) -> Option<(&'static str, Vec<String>)> {
        match self {
            Self::MissingColumns { missing } => Some(("missing", missing.clone())),
            _ => None,
        }
    }
}

// ── Parsed upload ────────────────────────────────────────────────────

/// A validated upload: the buffered bytes plus the detected content
/// kind. Importers read it through fresh cursors, so it can be consumed
/// more than once without re-uploading.
#[derive(Debug)]
pub struct ParsedUpload {
    kind: UploadKind,
    data: Vec<u8>,
}

impl ParsedUpload {
    pub fn kind(&self) -> UploadKind {
        self.kind
    }

    /// A reader positioned at the start of the buffer.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Validate an upload's structure and wrap it for re-reading.
///
/// `limit` caps how many JSON elements are inspected (delimited data
/// rows are not validated here at all; only the header is).
pub fn validate_upload(
    filename: &str,
    data: Vec<u8>,
    limit: usize,
) -> Result<ParsedUpload, UploadError> {
    let kind = UploadKind::from_filename(filename)
        .ok_or_else(|| UploadError::UnsupportedExtension(filename.to_string()))?;

    match kind {
        UploadKind::Csv => validate_csv_header(&data)?,
        UploadKind::Json => validate_json_records(&data, limit)?,
    }

    Ok(ParsedUpload { kind, data })
}

// ── Delimited text ───────────────────────────────────────────────────

/// Validate a delimited upload's header row: every column in
/// [`REQUIRED_CSV_COLUMNS`] must be present after lower-casing and
/// trimming. Data rows are not inspected.
pub fn validate_csv_header(data: &[u8]) -> Result<(), UploadError> {
    if data.iter().all(|byte| byte.is_ascii_whitespace()) {
        return Err(UploadError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);
    let headers = reader
        .headers()
        .map_err(|e| UploadError::MalformedCsv(e.to_string()))?;

    let present: Vec<String> = headers
        .iter()
        .map(|column| column.trim().to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_CSV_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|column| column == *required))
        .map(|required| (*required).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(UploadError::MissingColumns { missing })
    }
}

// ── Array-of-objects JSON ────────────────────────────────────────────

/// Validate a JSON upload: the root must be an array, and each element
/// (up to `limit`) must be an object carrying a non-blank `name`, a
/// non-blank `set` or `set_code`, and a non-blank `number` or
/// `collector_number`. The first failing element aborts validation with
/// a 1-based index.
pub fn validate_json_records(data: &[u8], limit: usize) -> Result<(), UploadError> {
    let root: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| UploadError::InvalidJson(e.to_string()))?;

    let elements = root.as_array().ok_or(UploadError::NotAnArray)?;

    for (i, element) in elements.iter().take(limit).enumerate() {
        let index = i + 1;
        let object = element
            .as_object()
            .ok_or(UploadError::ElementNotObject { index })?;

        if !has_non_blank(object, &["name"]) {
            return Err(UploadError::MissingField {
                index,
                field: "'name'",
            });
        }
        if !has_non_blank(object, &["set", "set_code"]) {
            return Err(UploadError::MissingField {
                index,
                field: "'set' or 'set_code'",
            });
        }
        if !has_non_blank(object, &["number", "collector_number"]) {
            return Err(UploadError::MissingField {
                index,
                field: "'number' or 'collector_number'",
            });
        }
    }

    Ok(())
}

fn has_non_blank(object: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| {
        object
            .get(*key)
            .and_then(|value| value.as_str())
            .is_some_and(|s| !s.trim().is_empty())
    })
}

// ── JSON element extraction ──────────────────────────────────────────

/// Map one already-validated JSON element to a candidate record.
///
/// Returns `None` for elements that fail the structural contract; this
/// only happens past the validation `limit`, and callers surface it as
/// a per-row problem rather than a request failure.
pub fn candidate_from_json(object: &serde_json::Map<String, serde_json::Value>) -> Option<CandidateRecord> {
    let string = |keys: &[&str]| -> Option<String> {
        keys.iter().find_map(|key| {
            object
                .get(*key)
                .and_then(|value| value.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    };

    let name = string(&["name"])?;
    let set_code = string(&["set", "set_code"])?;
    let collector_number = string(&["number", "collector_number"])?;

    Some(CandidateRecord {
        external_id: string(&["id", "external_id"]),
        name,
        set_code,
        set_name: string(&["set_name"]),
        collector_number,
        rarity: string(&["rarity"]),
        image_url: string(&["image_url", "image"]),
        price_cents: None,
        card_type: string(&["type", "card_type"]),
        rules_text: string(&["text", "rules_text"]),
    })
}

// ── Tests ────────────────────────────────────────────────────────────
