//! Importer for Disney Lorcana card data published by LorcanaJSON.
//!
//! Remote imports fetch the `allCards.json` document from the
//! configured base URL; file imports consume a validated CSV or JSON
//! upload. Both paths feed the shared reconciliation in
//! [`super::reconcile`].

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use deckstash_core::import::{CandidateRecord, ImportOptions, ImportSummary};
use deckstash_core::source::{SetRef, SourceDescriptor};
use deckstash_core::upload::ParsedUpload;
use deckstash_db::DbPool;

use super::{reconcile, rows, ImportError, SourceImporter};

/// Game identifier written to every card this importer touches.
const GAME: &str = "lorcana";

/// Canonical source key, written to `printings.source`.
const SOURCE_KEY: &str = "lorcana";

pub struct LorcanaImporter {
    base_url: String,
    client: reqwest::Client,
}

impl LorcanaImporter {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch and decode the remote card catalog, honoring cancellation
    /// across both network suspension points.
    async fn fetch_catalog(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RemoteCatalog, ImportError> {
        let url = format!("{}/allCards.json", self.base_url);
        tracing::debug!(%url, "Fetching remote card catalog");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ImportError::Cancelled),
            result = self.client.get(&url).send() => result?,
        };
        let response = response.error_for_status()?;

        let catalog = tokio::select! {
            _ = cancel.cancelled() => return Err(ImportError::Cancelled),
            result = response.json::<RemoteCatalog>() => result?,
        };
        Ok(catalog)
    }
}

#[async_trait]
impl SourceImporter for LorcanaImporter {
    fn key(&self) -> &'static str {
        "lorcana-json"
    }

    fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            key: SOURCE_KEY.to_string(),
            importer_key: self.key().to_string(),
            display_name: "Disney Lorcana (LorcanaJSON)".to_string(),
            games: vec![GAME.to_string()],
            sets: vec![
                SetRef::new("TFC", "The First Chapter"),
                SetRef::new("ROF", "Rise of the Floodborn"),
                SetRef::new("ITI", "Into the Inklands"),
                SetRef::new("URR", "Ursula's Return"),
                SetRef::new("SSK", "Shimmering Skies"),
                SetRef::new("AZS", "Azurite Sea"),
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
        let catalog = self.fetch_catalog(cancel).await?;

        let limit = options.effective_limit();
        let mut records = Vec::new();
        for card in catalog.cards {
            if records.len() >= limit {
                summary.info(format!("Row limit reached; considered the first {limit} remote records"));
                break;
            }
            match card.set_code.as_deref() {
                Some(set_code) if options.excludes_set(set_code) => continue,
                _ => {}
            }
            match to_candidate(card) {
                Ok(candidate) => records.push(candidate),
                Err((context, message)) => summary.error(&context, message),
            }
        }

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

// ── Remote payload ───────────────────────────────────────────────────

/// The slice of the LorcanaJSON document this importer reads. Unknown
/// fields are ignored.
#[derive(Debug, Deserialize)]
struct RemoteCatalog {
    #[serde(default)]
    cards: Vec<RemoteCard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCard {
    id: Option<i64>,
    name: String,
    /// Subtitle distinguishing versions of one character
    /// (e.g. "Snow Queen" on "Elsa - Snow Queen").
    version: Option<String>,
    #[serde(rename = "type")]
    card_type: Option<String>,
    full_text: Option<String>,
    set_code: Option<String>,
    set_name: Option<String>,
    number: Option<i64>,
    rarity: Option<String>,
    image_url: Option<String>,
}

/// Map one remote card to a candidate record, or report why it cannot
/// be imported.
fn to_candidate(card: RemoteCard) -> Result<CandidateRecord, (String, String)> {
    let context = match card.id {
        Some(id) => format!("remote card {id}"),
        None => format!("remote card '{}'", card.name),
    };

    let name = match &card.version {
        Some(version) => format!("{} - {}", card.name, version),
        None => card.name.clone(),
    };
    if name.trim().is_empty() {
        return Err((context, "missing card name".to_string()));
    }

    let set_code = card
        .set_code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| (context.clone(), "missing set code".to_string()))?;
    let collector_number = card
        .number
        .map(|n| n.to_string())
        .ok_or_else(|| (context.clone(), "missing collector number".to_string()))?;

    Ok(CandidateRecord {
        external_id: card.id.map(|id| id.to_string()),
        name,
        set_code,
        set_name: card.set_name,
        collector_number,
        rarity: card.rarity,
        image_url: card.image_url,
        price_cents: None,
        card_type: card.card_type,
        rules_text: card.full_text,
    })
}

// ── Tests ────────────────────────────────────────────────────────────
