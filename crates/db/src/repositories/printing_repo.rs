//! Repository for set-specific card printings.
//!
//! Same shape as `CardRepo`: pool reads, transaction-scoped writes.

use sqlx::PgPool;

use deckstash_core::types::DbId;

use crate::models::printing::{NewPrinting, Printing, UpdatePrinting};

/// Column list for `printings`.
const PRINTING_COLUMNS: &str =
    "id, card_id, set_code, set_name, collector_number, rarity, image_url, \
     price_cents, external_id, source, created_at, updated_at";

/// Provides lookup and write operations for printings.
pub struct PrintingRepo;

impl PrintingRepo {
    /// Find a printing by its natural key: owning card plus
    /// case-insensitive set code and collector number.
    pub async fn find_by_natural_key(
        pool: &PgPool,
        card_id: DbId,
        set_code: &str,
        collector_number: &str,
    ) -> Result<Option<Printing>, sqlx::Error> {
        let sql = format!(
            "SELECT {PRINTING_COLUMNS} FROM printings \
             WHERE card_id = $1 \
               AND lower(set_code) = lower($2) \
               AND lower(collector_number) = lower($3)"
        );
        sqlx::query_as::<_, Printing>(&sql)
            .bind(card_id)
            .bind(set_code)
            .bind(collector_number)
            .fetch_optional(pool)
            .await
    }

    /// Insert a printing within the apply transaction.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewPrinting,
    ) -> Result<Printing, sqlx::Error> {
        let sql = format!(
            "INSERT INTO printings \
                (card_id, set_code, set_name, collector_number, rarity, \
                 image_url, price_cents, external_id, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRINTING_COLUMNS}"
        );
        sqlx::query_as::<_, Printing>(&sql)
            .bind(input.card_id)
            .bind(&input.set_code)
            .bind(&input.set_name)
            .bind(&input.collector_number)
            .bind(&input.rarity)
            .bind(&input.image_url)
            .bind(input.price_cents)
            .bind(&input.external_id)
            .bind(&input.source)
            .fetch_one(&mut **tx)
            .await
    }

    /// Update a printing's mapped fields within the apply transaction.
    pub async fn update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        changes: &UpdatePrinting,
    ) -> Result<Printing, sqlx::Error> {
        let sql = format!(
            "UPDATE printings SET \
                set_name = $2, \
                rarity = $3, \
                image_url = $4, \
                price_cents = $5, \
                external_id = $6, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {PRINTING_COLUMNS}"
        );
        sqlx::query_as::<_, Printing>(&sql)
            .bind(id)
            .bind(&changes.set_name)
            .bind(&changes.rarity)
            .bind(&changes.image_url)
            .bind(changes.price_cents)
            .bind(&changes.external_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// List a card's printings, ordered by set and collector number.
    pub async fn list_by_card(
        pool: &PgPool,
        card_id: DbId,
    ) -> Result<Vec<Printing>, sqlx::Error> {
        let sql = format!(
            "SELECT {PRINTING_COLUMNS} FROM printings \
             WHERE card_id = $1 ORDER BY set_code, collector_number"
        );
        sqlx::query_as::<_, Printing>(&sql)
            .bind(card_id)
            .fetch_all(pool)
            .await
    }
}
