//! The shared reconciliation computation behind every source importer.
//!
//! Dry-run and apply are one algorithm: stage a plan of creates and
//! updates by natural-key lookup, tally the summary counters from the
//! plan, and only then decide whether to execute it. The commit is the
//! single branch the `dry_run` flag gates, which is what guarantees
//! dry-run counters always match apply counters for identical input.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use deckstash_core::import::{card_key, find_batch_duplicates, CandidateRecord, ImportOptions, ImportSummary};
use deckstash_core::types::DbId;
use deckstash_db::models::card::{Card, NewCard, UpdateCard};
use deckstash_db::models::printing::{NewPrinting, Printing, UpdatePrinting};
use deckstash_db::repositories::{CardRepo, PrintingRepo};
use deckstash_db::DbPool;

use super::ImportError;

// ── Plan ─────────────────────────────────────────────────────────────

/// A card reference usable before staged cards have database ids.
#[derive(Debug, Clone, Copy)]
enum CardRef {
    /// Card already in the catalog.
    Existing(DbId),
    /// Index into the plan's `new_cards`.
    Staged(usize),
}

/// A printing create staged against either an existing or a staged card.
#[derive(Debug)]
struct PlannedPrinting {
    card: CardRef,
    record: CandidateRecord,
}

/// Staged writes for one import batch. Counters are derived from the
/// plan, never from the execution.
#[derive(Debug, Default)]
struct Plan {
    new_cards: Vec<NewCard>,
    card_updates: Vec<(DbId, UpdateCard)>,
    new_printings: Vec<PlannedPrinting>,
    printing_updates: Vec<(DbId, UpdatePrinting)>,
}

// ── Reconciliation ───────────────────────────────────────────────────

/// Reconcile a batch of candidate records against the catalog.
///
/// Intra-batch duplicates (by printing natural key) are reported as one
/// error message each and excluded after their first occurrence. Under
/// `dry_run` the staged plan is discarded after tallying; otherwise it
/// executes inside one transaction, so a mid-batch failure leaves the
/// catalog unchanged.
pub async fn reconcile(
    pool: &DbPool,
    game: &str,
    source_key: &str,
    records: &[CandidateRecord],
    options: &ImportOptions,
    cancel: &CancellationToken,
    summary: &mut ImportSummary,
) -> Result<(), ImportError> {
    let mut skip: HashSet<usize> = HashSet::new();
    for duplicate in find_batch_duplicates(game, records) {
        let record = &records[duplicate.index];
        summary.error(
            "duplicate",
            format!(
                "'{}' ({} {}) appears more than once in this batch",
                record.name, record.set_code, record.collector_number
            ),
        );
        skip.insert(duplicate.index);
    }

    let plan = build_plan(pool, game, records, options, cancel, &skip).await?;

    summary.cards_created += plan.new_cards.len() as u32;
    summary.cards_updated += plan.card_updates.len() as u32;
    summary.printings_created += plan.new_printings.len() as u32;
    summary.printings_updated += plan.printing_updates.len() as u32;

    if !options.dry_run {
        execute_plan(pool, cancel, &plan, source_key).await?;
    }

    Ok(())
}

/// Stage creates and updates by natural-key lookup. Read-only.
async fn build_plan(
    pool: &DbPool,
    game: &str,
    records: &[CandidateRecord],
    options: &ImportOptions,
    cancel: &CancellationToken,
    skip: &HashSet<usize>,
) -> Result<Plan, ImportError> {
    let mut plan = Plan::default();
    // Card natural key -> index into plan.new_cards, so a batch with
    // several printings of one new card stages that card once.
    let mut staged_cards: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        if skip.contains(&index) {
            continue;
        }

        let key = card_key(game, &record.name);
        if let Some(&staged_index) = staged_cards.get(&key) {
            plan.new_printings.push(PlannedPrinting {
                card: CardRef::Staged(staged_index),
                record: record.clone(),
            });
            continue;
        }

        match CardRepo::find_by_natural_key(pool, game, &record.name).await? {
            None => {
                let staged_index = plan.new_cards.len();
                plan.new_cards.push(NewCard {
                    game: game.to_string(),
                    name: record.name.trim().to_string(),
                    card_type: record.card_type.clone(),
                    rules_text: record.rules_text.clone(),
                    created_by: options.acting_user_id,
                });
                staged_cards.insert(key, staged_index);
                plan.new_printings.push(PlannedPrinting {
                    card: CardRef::Staged(staged_index),
                    record: record.clone(),
                });
            }
            Some(card) => {
                if let Some(update) = card_update(&card, record) {
                    if !plan.card_updates.iter().any(|(id, _)| *id == card.id) {
                        plan.card_updates.push((card.id, update));
                    }
                }

                let existing = PrintingRepo::find_by_natural_key(
                    pool,
                    card.id,
                    &record.set_code,
                    &record.collector_number,
                )
                .await?;
                match existing {
                    None => plan.new_printings.push(PlannedPrinting {
                        card: CardRef::Existing(card.id),
                        record: record.clone(),
                    }),
                    Some(printing) => {
                        if let Some(update) = printing_update(&printing, record) {
                            plan.printing_updates.push((printing.id, update));
                        }
                    }
                }
            }
        }
    }

    Ok(plan)
}

/// Execute a staged plan inside one transaction.
async fn execute_plan(
    pool: &DbPool,
    cancel: &CancellationToken,
    plan: &Plan,
    source_key: &str,
) -> Result<(), ImportError> {
    if cancel.is_cancelled() {
        return Err(ImportError::Cancelled);
    }

    let mut tx = pool.begin().await?;

    let mut staged_ids: Vec<DbId> = Vec::with_capacity(plan.new_cards.len());
    for new_card in &plan.new_cards {
        staged_ids.push(CardRepo::insert(&mut tx, new_card).await?.id);
    }
    for (id, update) in &plan.card_updates {
        CardRepo::update(&mut tx, *id, update).await?;
    }
    for planned in &plan.new_printings {
        let card_id = match planned.card {
            CardRef::Existing(id) => id,
            CardRef::Staged(index) => staged_ids[index],
        };
        PrintingRepo::insert(&mut tx, &new_printing(card_id, &planned.record, source_key)).await?;
    }
    for (id, update) in &plan.printing_updates {
        PrintingRepo::update(&mut tx, *id, update).await?;
    }

    tx.commit().await?;
    Ok(())
}

// ── Field mapping ────────────────────────────────────────────────────

fn new_printing(card_id: DbId, record: &CandidateRecord, source_key: &str) -> NewPrinting {
    NewPrinting {
        card_id,
        set_code: record.set_code.clone(),
        set_name: record.set_name.clone(),
        collector_number: record.collector_number.clone(),
        rarity: record.rarity.clone(),
        image_url: record.image_url.clone(),
        price_cents: record.price_cents,
        external_id: record.external_id.clone(),
        source: source_key.to_string(),
    }
}

/// Merge a candidate into an existing card: fields the candidate does
/// not carry keep their current values. Returns `None` when nothing
/// mapped actually differs.
fn card_update(existing: &Card, record: &CandidateRecord) -> Option<UpdateCard> {
    let card_type = record
        .card_type
        .clone()
        .or_else(|| existing.card_type.clone());
    let rules_text = record
        .rules_text
        .clone()
        .or_else(|| existing.rules_text.clone());

    if card_type != existing.card_type || rules_text != existing.rules_text {
        Some(UpdateCard {
            card_type,
            rules_text,
        })
    } else {
        None
    }
}

/// Merge a candidate into an existing printing, same contract as
/// [`card_update`].
fn printing_update(existing: &Printing, record: &CandidateRecord) -> Option<UpdatePrinting> {
    let set_name = record.set_name.clone().or_else(|| existing.set_name.clone());
    let rarity = record.rarity.clone().or_else(|| existing.rarity.clone());
    let image_url = record
        .image_url
        .clone()
        .or_else(|| existing.image_url.clone());
    let price_cents = record.price_cents.or(existing.price_cents);
    let external_id = record
        .external_id
        .clone()
        .or_else(|| existing.external_id.clone());

    let changed = set_name != existing.set_name
        || rarity != existing.rarity
        || image_url != existing.image_url
        || price_cents != existing.price_cents
        || external_id != existing.external_id;

    if changed {
        Some(UpdatePrinting {
            set_name,
            rarity,
            image_url,
            price_cents,
            external_id,
        })
    } else {
        None
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn existing_card() -> Card {
        Card {
            id: 1,
            game: "lorcana".to_string(),
            name: "Elsa".to_string(),
            card_type: Some("Character".to_string()),
            rules_text: None,
            created_by: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn existing_printing() -> Printing {
        Printing {
            id: 10,
            card_id: 1,
            set_code: "TFC".to_string(),
            set_name: Some("The First Chapter".to_string()),
            collector_number: "4".to_string(),
            rarity: Some("Rare".to_string()),
            image_url: None,
            price_cents: Some(150),
            external_id: None,
            source: "lorcana".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn candidate() -> CandidateRecord {
        CandidateRecord {
            name: "Elsa".to_string(),
            set_code: "TFC".to_string(),
            collector_number: "4".to_string(),
            ..CandidateRecord::default()
        }
    }

    #[test]
    fn identical_candidate_stages_no_card_update() {
        let record = CandidateRecord {
            card_type: Some("Character".to_string()),
            ..candidate()
        };
        assert!(card_update(&existing_card(), &record).is_none());
    }

    #[test]
    fn unmapped_candidate_fields_do_not_clobber() {
        // Candidate carries no card_type (e.g. a minimal CSV); the
        // existing value must survive, so nothing differs.
        assert!(card_update(&existing_card(), &candidate()).is_none());
    }

    #[test]
    fn differing_mapped_field_stages_a_card_update() {
        let record = CandidateRecord {
            rules_text: Some("Rush.".to_string()),
            ..candidate()
        };
        let update = card_update(&existing_card(), &record).unwrap();
        assert_eq!(update.card_type.as_deref(), Some("Character"));
        assert_eq!(update.rules_text.as_deref(), Some("Rush."));
    }

    #[test]
    fn identical_printing_stages_no_update() {
        let record = CandidateRecord {
            rarity: Some("Rare".to_string()),
            price_cents: Some(150),
            ..candidate()
        };
        assert!(printing_update(&existing_printing(), &record).is_none());
    }

    #[test]
    fn changed_price_stages_a_printing_update() {
        let record = CandidateRecord {
            price_cents: Some(250),
            ..candidate()
        };
        let update = printing_update(&existing_printing(), &record).unwrap();
        assert_eq!(update.price_cents, Some(250));
        // Unmapped fields are merged from the existing row.
        assert_eq!(update.rarity.as_deref(), Some("Rare"));
        assert_eq!(update.set_name.as_deref(), Some("The First Chapter"));
    }
}
