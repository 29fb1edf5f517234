//! Integration tests for the card and printing repositories.
//!
//! Each test runs against a fresh database with migrations applied.

use sqlx::PgPool;

use deckstash_db::models::card::{NewCard, UpdateCard};
use deckstash_db::models::printing::{NewPrinting, UpdatePrinting};
use deckstash_db::repositories::{CardRepo, PrintingRepo};

fn new_card(name: &str) -> NewCard {
    NewCard {
        game: "lorcana".to_string(),
        name: name.to_string(),
        card_type: Some("Character".to_string()),
        rules_text: None,
        created_by: None,
    }
}

fn new_printing(card_id: i64, set_code: &str, number: &str) -> NewPrinting {
    NewPrinting {
        card_id,
        set_code: set_code.to_string(),
        set_name: Some("The First Chapter".to_string()),
        collector_number: number.to_string(),
        rarity: Some("Rare".to_string()),
        image_url: None,
        price_cents: Some(150),
        external_id: None,
        source: "lorcana".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn card_natural_key_lookup_is_case_insensitive(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let created = CardRepo::insert(&mut tx, &new_card("Elsa - Snow Queen"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let found = CardRepo::find_by_natural_key(&pool, "lorcana", "ELSA - SNOW QUEEN")
        .await
        .unwrap()
        .expect("card should be found by case-folded name");
    assert_eq!(found.id, created.id);

    // Same name under another game is a different card.
    let missing = CardRepo::find_by_natural_key(&pool, "mtg", "Elsa - Snow Queen")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test]
async fn card_update_touches_mapped_fields(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let created = CardRepo::insert(&mut tx, &new_card("Maui")).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let updated = CardRepo::update(
        &mut tx,
        created.id,
        &UpdateCard {
            card_type: Some("Character".to_string()),
            rules_text: Some("Rush.".to_string()),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.rules_text.as_deref(), Some("Rush."));
    assert!(updated.updated_at >= created.updated_at);
}

#[sqlx::test]
async fn duplicate_card_violates_unique_index(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    CardRepo::insert(&mut tx, &new_card("Elsa")).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let result = CardRepo::insert(&mut tx, &new_card("ELSA")).await;

    let err = result.expect_err("case-folded duplicate should violate uq_cards_game_name");
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
            assert!(db_err
                .constraint()
                .is_some_and(|name| name.starts_with("uq_")));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Printings
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn printing_natural_key_lookup(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let card = CardRepo::insert(&mut tx, &new_card("Elsa")).await.unwrap();
    let printing = PrintingRepo::insert(&mut tx, &new_printing(card.id, "TFC", "4"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let found = PrintingRepo::find_by_natural_key(&pool, card.id, "tfc", "4")
        .await
        .unwrap()
        .expect("printing should be found by case-folded set code");
    assert_eq!(found.id, printing.id);

    let missing = PrintingRepo::find_by_natural_key(&pool, card.id, "TFC", "5")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test]
async fn printing_update_touches_mapped_fields(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let card = CardRepo::insert(&mut tx, &new_card("Elsa")).await.unwrap();
    let printing = PrintingRepo::insert(&mut tx, &new_printing(card.id, "TFC", "4"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let updated = PrintingRepo::update(
        &mut tx,
        printing.id,
        &UpdatePrinting {
            set_name: printing.set_name.clone(),
            rarity: Some("Legendary".to_string()),
            image_url: Some("https://img.example/elsa.png".to_string()),
            price_cents: Some(250),
            external_id: printing.external_id.clone(),
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.rarity.as_deref(), Some("Legendary"));
    assert_eq!(updated.price_cents, Some(250));
}

#[sqlx::test]
async fn duplicate_printing_violates_unique_index(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let card = CardRepo::insert(&mut tx, &new_card("Elsa")).await.unwrap();
    PrintingRepo::insert(&mut tx, &new_printing(card.id, "TFC", "4"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let result = PrintingRepo::insert(&mut tx, &new_printing(card.id, "tfc", "4")).await;

    let err = result.expect_err("duplicate natural key should violate the unique index");
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[sqlx::test]
async fn list_by_card_orders_by_set_and_number(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    let card = CardRepo::insert(&mut tx, &new_card("Elsa")).await.unwrap();
    PrintingRepo::insert(&mut tx, &new_printing(card.id, "ROF", "10"))
        .await
        .unwrap();
    PrintingRepo::insert(&mut tx, &new_printing(card.id, "TFC", "4"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let printings = PrintingRepo::list_by_card(&pool, card.id).await.unwrap();
    assert_eq!(printings.len(), 2);
    assert_eq!(printings[0].set_code, "ROF");
    assert_eq!(printings[1].set_code, "TFC");
}
