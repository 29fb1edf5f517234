//! Built-in sample source with a fixed two-record batch.
//!
//! Registered like any other source so the full dry-run and apply
//! paths can be exercised without network access. Integration tests
//! lean on it for the idempotency and counter-consistency guarantees.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use deckstash_core::import::{CandidateRecord, ImportOptions, ImportSummary};
use deckstash_core::source::{SetRef, SourceDescriptor};
use deckstash_core::upload::ParsedUpload;
use deckstash_db::DbPool;

use super::{reconcile, rows, ImportError, SourceImporter};

const GAME: &str = "dummy";
const SOURCE_KEY: &str = "dummy";

pub struct DummyImporter;

impl DummyImporter {
    pub fn new() -> Self {
        Self
    }

    /// The fixed sample batch a "remote" import produces.
    fn sample_records() -> Vec<CandidateRecord> {
        vec![
            CandidateRecord {
                external_id: Some("dummy-alpha-1".to_string()),
                name: "Sample Dragon".to_string(),
                set_code: "ALPHA".to_string(),
                set_name: Some("Alpha Edition".to_string()),
                collector_number: "1".to_string(),
                rarity: Some("Rare".to_string()),
                image_url: None,
                price_cents: Some(125),
                card_type: Some("Creature".to_string()),
                rules_text: Some("Flying.".to_string()),
            },
            CandidateRecord {
                external_id: Some("dummy-beta-1".to_string()),
                name: "Sample Wizard".to_string(),
                set_code: "BETA".to_string(),
                set_name: Some("Beta Edition".to_string()),
                collector_number: "1".to_string(),
                rarity: Some("Common".to_string()),
                image_url: None,
                price_cents: Some(50),
                card_type: Some("Creature".to_string()),
                rules_text: None,
            },
        ]
    }
}

impl Default for DummyImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceImporter for DummyImporter {
    fn key(&self) -> &'static str {
        SOURCE_KEY
    }

    fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            key: SOURCE_KEY.to_string(),
            importer_key: SOURCE_KEY.to_string(),
            display_name: "Dummy (built-in sample data)".to_string(),
            games: vec![GAME.to_string()],
            sets: vec![
                SetRef::new("ALPHA", "Alpha Edition"),
                SetRef::new("BETA", "Beta Edition"),
            ],
        }
    }

    async fn import_from_remote(
        &self,
        pool: &DbPool,
        options: &ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::new(SOURCE_KEY, options.dry_run);

        let records: Vec<CandidateRecord> = Self::sample_records()
            .into_iter()
            .filter(|record| !options.excludes_set(&record.set_code))
            .take(options.effective_limit())
            .collect();

        reconcile::reconcile(pool, GAME, SOURCE_KEY, &records, options, cancel, &mut summary)
            .await?;
        Ok(summary)
    }

    async fn import_from_file(
        &self,
        pool: &DbPool,
        upload: &ParsedUpload,
        options: &ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::new(SOURCE_KEY, options.dry_run);
        let records = rows::candidates_from_upload(upload, options, &mut summary);
        reconcile::reconcile(pool, GAME, SOURCE_KEY, &records, options, cancel, &mut summary)
            .await?;
        Ok(summary)
    }
}
