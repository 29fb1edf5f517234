//! Canonical source vocabulary for the catalog import pipeline.
//!
//! Two static tables drive name resolution:
//!
//! - [`SOURCE_ALIASES`]: many human/legacy spellings -> one canonical
//!   source key (the name shown in UI option lists).
//! - [`REGISTRY_KEYS`]: canonical key -> the key the importer registry
//!   is indexed by. The two are allowed to diverge.
//!
//! Both lookups are intentionally permissive: a name missing from a
//! table passes through unchanged, so the registry lookup stays the
//! single source of truth for "does this source exist".

use serde::Serialize;

/// Alias spellings mapped to canonical source keys. Lookup is
/// case-insensitive over the trimmed input.
pub const SOURCE_ALIASES: &[(&str, &str)] = &[
    ("lorcana", "lorcana"),
    ("lorcana-json", "lorcana"),
    ("lorcanajson", "lorcana"),
    ("disney lorcana", "lorcana"),
    ("dummy", "dummy"),
    ("sample", "dummy"),
];

/// Canonical source keys mapped to importer registry keys.
pub const REGISTRY_KEYS: &[(&str, &str)] = &[("lorcana", "lorcana-json")];

/// Resolve a raw source name to its canonical key.
///
/// Returns `None` only for empty/whitespace input. Unknown spellings
/// fall through unchanged (lower-cased) rather than erroring here.
pub fn canonical_source_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    let canonical = SOURCE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(lowered);
    Some(canonical)
}

/// Map a canonical source key to the importer registry key, passing the
/// key through unchanged when no mapping exists.
pub fn registry_key(canonical: &str) -> String {
    REGISTRY_KEYS
        .iter()
        .find(|(key, _)| *key == canonical)
        .map(|(_, registry)| (*registry).to_string())
        .unwrap_or_else(|| canonical.to_string())
}

// ── Source catalog ───────────────────────────────────────────────────

/// A set/expansion reference advertised by a source.
#[derive(Debug, Clone, Serialize)]
pub struct SetRef {
    pub code: String,
    pub name: String,
}

impl SetRef {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// Static description of one import source, returned by the options
/// endpoint so the UI can render a source picker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    /// Canonical source key (UI-facing).
    pub key: String,
    /// Key the importer registry is indexed by.
    pub importer_key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Games this source provides cards for.
    pub games: Vec<String>,
    /// Known sets/expansions, usable as a `set` filter on remote imports.
    pub sets: Vec<SetRef>,
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_spellings_converge() {
        for raw in ["lorcana", "lorcana-json", "LorcanaJSON", "Disney Lorcana"] {
            assert_eq!(
                canonical_source_key(raw).as_deref(),
                Some("lorcana"),
                "raw: {raw}"
            );
        }
    }

    #[test]
    fn blank_input_rejected() {
        assert!(canonical_source_key("").is_none());
        assert!(canonical_source_key("   ").is_none());
        assert!(canonical_source_key("\t\n").is_none());
    }

    #[test]
    fn unknown_spelling_passes_through() {
        assert_eq!(
            canonical_source_key("Not-A-Real-Source").as_deref(),
            Some("not-a-real-source")
        );
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(
            canonical_source_key("  lorcana  ").as_deref(),
            Some("lorcana")
        );
    }

    #[test]
    fn canonical_maps_to_registry_key() {
        assert_eq!(registry_key("lorcana"), "lorcana-json");
    }

    #[test]
    fn unmapped_canonical_passes_through() {
        assert_eq!(registry_key("dummy"), "dummy");
        assert_eq!(registry_key("not-a-real-source"), "not-a-real-source");
    }
}
