//! Import options, summaries, candidate records, and batch-level
//! duplicate detection for the catalog import pipeline.
//!
//! The dry-run and apply paths share one reconciliation computation;
//! the types here carry its inputs and outputs. Nothing in this module
//! touches the database.

use std::collections::HashMap;

use serde::Serialize;

// ── Constants ────────────────────────────────────────────────────────

/// Row cap used for file parsing and previews when the caller does not
/// supply an explicit limit.
pub const DEFAULT_PREVIEW_LIMIT: usize = 500;

/// Prefix marking a summary message as an invalid-row diagnostic.
pub const ERROR_MESSAGE_PREFIX: &str = "Error";

// ── Import Options ───────────────────────────────────────────────────

/// Options for one importer invocation. Constructed fresh per request
/// and never shared across requests.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Compute changes without persisting anything.
    pub dry_run: bool,
    /// Update existing rows instead of skipping them. Always true in
    /// practice; the pipeline never deletes.
    pub upsert: bool,
    /// Cap on rows considered, primarily for previews and file parsing.
    pub limit: Option<usize>,
    /// Identity of the caller, passed through from the upstream auth layer.
    pub acting_user_id: Option<i64>,
    /// Narrow a remote fetch to one set/expansion.
    pub set_code: Option<String>,
}

impl ImportOptions {
    /// The row cap to apply, falling back to [`DEFAULT_PREVIEW_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PREVIEW_LIMIT)
    }

    /// Returns true when `set_code` is set and does not match `code`
    /// (case-insensitive).
    pub fn excludes_set(&self, code: &str) -> bool {
        match &self.set_code {
            Some(filter) => !filter.eq_ignore_ascii_case(code),
            None => false,
        }
    }
}

// ── Import Summary ───────────────────────────────────────────────────

/// Aggregate result of one importer invocation: monotonic counters plus
/// ordered free-text diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub source: String,
    pub dry_run: bool,
    pub cards_created: u32,
    pub cards_updated: u32,
    pub printings_created: u32,
    pub printings_updated: u32,
    pub errors: u32,
    pub messages: Vec<String>,
}

impl ImportSummary {
    pub fn new(source: &str, dry_run: bool) -> Self {
        Self {
            source: source.to_string(),
            dry_run,
            cards_created: 0,
            cards_updated: 0,
            printings_created: 0,
            printings_updated: 0,
            errors: 0,
            messages: Vec::new(),
        }
    }

    /// Record an invalid-row diagnostic and bump the error counter.
    ///
    /// The message is prefixed `"Error [{context}]"` so the preview
    /// builder can partition it from informational messages.
    pub fn error(&mut self, context: &str, message: impl AsRef<str>) {
        self.errors += 1;
        self.messages
            .push(format!("Error [{context}] {}", message.as_ref()));
    }

    /// Record an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Total rows that would be (or were) created.
    pub fn created(&self) -> u32 {
        self.cards_created + self.printings_created
    }

    /// Total rows that would be (or were) updated.
    pub fn updated(&self) -> u32 {
        self.cards_updated + self.printings_updated
    }
}

/// Returns true if a summary message is an invalid-row diagnostic
/// (case-insensitive `"Error"` prefix).
pub fn is_error_message(message: &str) -> bool {
    message
        .trim_start()
        .to_lowercase()
        .starts_with(&ERROR_MESSAGE_PREFIX.to_lowercase())
}

// ── Candidate Records ────────────────────────────────────────────────

/// One normalized record emitted by a source importer, before
/// reconciliation against the catalog. The card's game comes from the
/// importer itself, never from the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    /// Source-side identifier, when the source has one.
    pub external_id: Option<String>,
    /// Card name (natural-key component, compared case-insensitively).
    pub name: String,
    /// Set/expansion code (natural-key component).
    pub set_code: String,
    /// Human-readable set name, when known.
    pub set_name: Option<String>,
    /// Collector number within the set (natural-key component).
    pub collector_number: String,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub card_type: Option<String>,
    pub rules_text: Option<String>,
}

/// Natural key for a card: game plus case-folded name.
pub fn card_key(game: &str, name: &str) -> String {
    format!("{game}|{}", name.trim().to_lowercase())
}

/// Natural key for a printing: the card key plus case-folded set code
/// and collector number.
pub fn printing_key(game: &str, name: &str, set_code: &str, collector_number: &str) -> String {
    format!(
        "{}|{}|{}",
        card_key(game, name),
        set_code.trim().to_lowercase(),
        collector_number.trim().to_lowercase()
    )
}

// ── Batch duplicate detection ────────────────────────────────────────

/// A record whose printing natural key already appeared earlier in the
/// same input batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDuplicate {
    /// Index of the duplicate occurrence.
    pub index: usize,
    /// Index of the first occurrence it collides with.
    pub first_index: usize,
    /// The shared natural key.
    pub key: String,
}

/// Detect intra-batch duplicates by printing natural key.
///
/// The first occurrence of each key is kept; every later occurrence is
/// reported so the caller can surface one error message per duplicate
/// instead of silently collapsing or double-writing.
pub fn find_batch_duplicates(game: &str, records: &[CandidateRecord]) -> Vec<BatchDuplicate> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let key = printing_key(game, &record.name, &record.set_code, &record.collector_number);
        match seen.get(&key) {
            Some(&first_index) => duplicates.push(BatchDuplicate {
                index,
                first_index,
                key,
            }),
            None => {
                seen.insert(key, index);
            }
        }
    }

    duplicates
}

// ── Price parsing ────────────────────────────────────────────────────

/// Parse a decimal price string (`"1.99"`, `"$12"`, `"0.50"`) into
/// integer cents.
pub fn parse_price_cents(raw: &str) -> Result<i64, String> {
    let cleaned = raw.trim().trim_start_matches('$').trim();
    if cleaned.is_empty() {
        return Err("price is blank".to_string());
    }

    let (dollars, cents) = match cleaned.split_once('.') {
        Some((d, c)) => (d, c),
        None => (cleaned, ""),
    };

    let dollars: i64 = dollars
        .parse()
        .map_err(|_| format!("invalid price '{raw}'"))?;
    if dollars < 0 {
        return Err(format!("negative price '{raw}'"));
    }

    let cents: i64 = match cents.len() {
        0 => 0,
        1 => {
            10 * cents
                .parse::<i64>()
                .map_err(|_| format!("invalid price '{raw}'"))?
        }
        2 => cents
            .parse()
            .map_err(|_| format!("invalid price '{raw}'"))?,
        _ => return Err(format!("invalid price '{raw}'")),
    };

    Ok(dollars * 100 + cents)
}

// ── Tests ────────────────────────────────────────────────────────────
