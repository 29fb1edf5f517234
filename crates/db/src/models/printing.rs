//! Models for set-specific card printings.

use deckstash_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `printings` table. The natural key is
/// `(card_id, lower(set_code), lower(collector_number))`, enforced by
/// the `uq_printings_card_set_number` index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Printing {
    pub id: DbId,
    pub card_id: DbId,
    pub set_code: String,
    pub set_name: Option<String>,
    pub collector_number: String,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub external_id: Option<String>,
    /// Canonical key of the source that last wrote this row.
    pub source: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a printing.
#[derive(Debug, Clone)]
pub struct NewPrinting {
    pub card_id: DbId,
    pub set_code: String,
    pub set_name: Option<String>,
    pub collector_number: String,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub external_id: Option<String>,
    pub source: String,
}

/// DTO for updating a printing's mapped fields. Values are written
/// wholesale; the reconciler merges unchanged fields in beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePrinting {
    pub set_name: Option<String>,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: Option<i64>,
    pub external_id: Option<String>,
}
