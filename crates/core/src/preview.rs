//! Dry-run preview builder: turns an [`ImportSummary`] into the
//! structured table a reviewer sees before committing an import.

use serde::Serialize;

use crate::import::{is_error_message, ImportSummary};

// ── Types ────────────────────────────────────────────────────────────

/// Review status of one preview row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStatus {
    New,
    Update,
    Invalid,
    Info,
}

/// One human-readable line in the dry-run report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub external_id: String,
    pub name: String,
    pub game: String,
    pub set: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printing_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub status: RowStatus,
    pub messages: Vec<String>,
}

impl PreviewRow {
    fn aggregate(name: &str, status: RowStatus, message: String) -> Self {
        Self {
            external_id: String::new(),
            name: name.to_string(),
            game: String::new(),
            set: String::new(),
            rarity: None,
            printing_key: None,
            image_url: None,
            price: None,
            status,
            messages: vec![message],
        }
    }
}

/// Aggregate counts shown above the preview table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PreviewSummary {
    pub new: u32,
    pub update: u32,
    pub duplicate: u32,
    pub invalid: u32,
}

/// The dry-run response body.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub summary: PreviewSummary,
    pub rows: Vec<PreviewRow>,
}

// ── Builder ──────────────────────────────────────────────────────────

/// Build the preview table for a dry-run summary.
///
/// Creates at most one aggregate "New records" row and one "Existing
/// records" row, then one row per summary message: error-prefixed
/// messages become `Invalid` rows, the rest become `Info` rows.
///
/// The `invalid` total deliberately counts both the structured error
/// counter and the error-prefixed messages, tolerating importers that
/// only populate one of the two.
pub fn build_preview(summary: &ImportSummary) -> PreviewReport {
    let mut rows = Vec::new();

    let created = summary.created();
    if created > 0 {
        rows.push(PreviewRow::aggregate(
            "New records",
            RowStatus::New,
            format!(
                "{} card(s) and {} printing(s) would be created",
                summary.cards_created, summary.printings_created
            ),
        ));
    }

    let updated = summary.updated();
    if updated > 0 {
        rows.push(PreviewRow::aggregate(
            "Existing records",
            RowStatus::Update,
            format!(
                "{} card(s) and {} printing(s) would be updated",
                summary.cards_updated, summary.printings_updated
            ),
        ));
    }

    let mut error_messages: u32 = 0;
    let mut duplicate: u32 = 0;
    for message in &summary.messages {
        let status = if is_error_message(message) {
            error_messages += 1;
            if message.to_lowercase().contains("duplicate") {
                duplicate += 1;
            }
            RowStatus::Invalid
        } else {
            RowStatus::Info
        };
        rows.push(PreviewRow::aggregate("", status, message.clone()));
    }

    PreviewReport {
        summary: PreviewSummary {
            new: created,
            update: updated,
            duplicate,
            invalid: summary.errors + error_messages,
        },
        rows,
    }
}

// ── Tests ────────────────────────────────────────────────────────────
