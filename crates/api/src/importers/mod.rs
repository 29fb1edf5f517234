//! Source importers for the catalog import pipeline.
//!
//! Each external catalog source implements [`SourceImporter`]. The
//! [`ImporterRegistry`] holds one eagerly-constructed instance per
//! source, keyed by a stable lowercase identifier, and resolves raw
//! source names through the alias tables in `deckstash_core::source`.

mod dummy;
mod lorcana;
pub mod reconcile;
mod rows;

pub use dummy::DummyImporter;
pub use lorcana::LorcanaImporter;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use deckstash_core::import::{ImportOptions, ImportSummary};
use deckstash_core::source::{self, SourceDescriptor};
use deckstash_core::upload::ParsedUpload;
use deckstash_db::DbPool;

use crate::config::ServerConfig;

// ── Errors ───────────────────────────────────────────────────────────

/// Failure of a whole importer invocation. Per-row problems never
/// surface here; they are accumulated into the summary instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("remote fetch failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("remote payload could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("import was cancelled")]
    Cancelled,
}

// ── Contract ─────────────────────────────────────────────────────────

/// One external catalog source.
///
/// Both operations run the same reconciliation; they differ only in
/// where candidate records come from. The cancellation token must be
/// honored across remote fetches and database round trips.
#[async_trait]
pub trait SourceImporter: Send + Sync {
    /// The registry lookup key (stable, lowercase).
    fn key(&self) -> &'static str;

    /// Static description for the options endpoint.
    fn descriptor(&self) -> SourceDescriptor;

    /// Fetch records from the source's remote endpoint and reconcile
    /// them against the catalog.
    async fn import_from_remote(
        &self,
        pool: &DbPool,
        options: &ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError>;

    /// Reconcile records from an already-validated upload.
    async fn import_from_file(
        &self,
        pool: &DbPool,
        upload: &ParsedUpload,
        options: &ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportSummary, ImportError>;
}

// ── Registry ─────────────────────────────────────────────────────────

/// The fixed set of importer instances, constructed once at startup
/// and treated as immutable thereafter.
pub struct ImporterRegistry {
    importers: Vec<Box<dyn SourceImporter>>,
}

impl ImporterRegistry {
    /// Construct every importer variant eagerly.
    pub fn new(config: &ServerConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            importers: vec![
                Box::new(LorcanaImporter::new(&config.lorcana_base_url, client)),
                Box::new(DummyImporter::new()),
            ],
        }
    }

    /// Resolve a raw source name to an importer.
    ///
    /// Alias and registry-key lookups are permissive pass-throughs;
    /// this final lookup is the single source of truth for "does this
    /// source exist".
    pub fn resolve(&self, raw: &str) -> Option<&dyn SourceImporter> {
        let canonical = source::canonical_source_key(raw)?;
        let registry_key = source::registry_key(&canonical);
        self.importers
            .iter()
            .find(|importer| importer.key().eq_ignore_ascii_case(&registry_key))
            .map(|importer| importer.as_ref())
    }

    /// Static descriptions of every registered source.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.importers
            .iter()
            .map(|importer| importer.descriptor())
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
