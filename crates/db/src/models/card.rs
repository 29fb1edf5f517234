//! Models for canonical catalog cards.

use deckstash_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cards` table. The natural key is
/// `(game, lower(name))`, enforced by the `uq_cards_game_name` index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Card {
    pub id: DbId,
    pub game: String,
    pub name: String,
    pub card_type: Option<String>,
    pub rules_text: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a card.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub game: String,
    pub name: String,
    pub card_type: Option<String>,
    pub rules_text: Option<String>,
    pub created_by: Option<DbId>,
}

/// DTO for updating a card's mapped fields. Values are written
/// wholesale; the reconciler merges unchanged fields in beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCard {
    pub card_type: Option<String>,
    pub rules_text: Option<String>,
}
