//! Repository for canonical catalog cards.
//!
//! Reads run against the pool; writes only happen inside the import
//! apply transaction, so every mutating method takes a [`sqlx::Transaction`].

use sqlx::PgPool;

use deckstash_core::types::DbId;

use crate::models::card::{Card, NewCard, UpdateCard};

/// Column list for `cards`.
const CARD_COLUMNS: &str =
    "id, game, name, card_type, rules_text, created_by, created_at, updated_at";

/// Provides lookup and write operations for cards.
pub struct CardRepo;

impl CardRepo {
    /// Find a card by its natural key: game plus case-insensitive name.
    pub async fn find_by_natural_key(
        pool: &PgPool,
        game: &str,
        name: &str,
    ) -> Result<Option<Card>, sqlx::Error> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards \
             WHERE game = $1 AND lower(name) = lower($2)"
        );
        sqlx::query_as::<_, Card>(&sql)
            .bind(game)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Insert a card within the apply transaction.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewCard,
    ) -> Result<Card, sqlx::Error> {
        let sql = format!(
            "INSERT INTO cards (game, name, card_type, rules_text, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CARD_COLUMNS}"
        );
        sqlx::query_as::<_, Card>(&sql)
            .bind(&input.game)
            .bind(&input.name)
            .bind(&input.card_type)
            .bind(&input.rules_text)
            .bind(input.created_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Update a card's mapped fields within the apply transaction.
    pub async fn update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        changes: &UpdateCard,
    ) -> Result<Card, sqlx::Error> {
        let sql = format!(
            "UPDATE cards SET \
                card_type = $2, \
                rules_text = $3, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {CARD_COLUMNS}"
        );
        sqlx::query_as::<_, Card>(&sql)
            .bind(id)
            .bind(&changes.card_type)
            .bind(&changes.rules_text)
            .fetch_one(&mut **tx)
            .await
    }

    /// Count cards for a game. Used by health-style checks and tests.
    pub async fn count_by_game(pool: &PgPool, game: &str) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cards WHERE game = $1")
            .bind(game)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
