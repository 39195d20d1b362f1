//! Video-segment catalog and gloss-to-segment resolution.
//!
//! The catalog is an external collaborator looked up by gloss identifier.
//! Resolution is total and length-preserving: every gloss token yields
//! exactly one [`SegmentRef`], with misses marked `Unresolved` in place so
//! renderers can report which signs are missing instead of receiving a
//! truncated plan.

use crate::gloss::{GlossSequence, GlossToken};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Catalog gloss id used for fingerspelled tokens.
pub const FINGERSPELL_GLOSS: &str = "FINGERSPELL";

/// Reference into the video-segment catalog, or a positional miss.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentRef {
    Resolved { segment_id: String, uri: String },
    Unresolved { token: GlossToken },
}

impl SegmentRef {
    pub fn is_resolved(&self) -> bool {
        matches!(self, SegmentRef::Resolved { .. })
    }
}

/// Ordered segment references, positionally aligned with the gloss
/// sequence they were derived from.
pub type SegmentPlan = Vec<SegmentRef>;

/// One catalog record: a pre-existing video segment for a gloss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub gloss: String,
    pub segment_id: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f32>,
}

/// Read-only lookup into the video-segment catalog.
///
/// Returns every candidate for a gloss; variant selection is the
/// resolver's job.
#[async_trait]
pub trait SegmentCatalog: Send + Sync {
    async fn lookup(&self, gloss_id: &str) -> Vec<CatalogEntry>;
}

/// In-memory catalog loaded from a JSON file at startup.
///
/// Immutable for the process lifetime; reloads happen by building a new
/// catalog and swapping the `Arc` at the caller, never in place.
#[derive(Debug, Default)]
pub struct JsonCatalog {
    by_gloss: HashMap<String, Vec<CatalogEntry>>,
}

impl JsonCatalog {
    /// Catalog with no segments; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from entries, preserving per-gloss candidate order.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut by_gloss: HashMap<String, Vec<CatalogEntry>> = HashMap::new();
        for entry in entries {
            by_gloss.entry(entry.gloss.clone()).or_default().push(entry);
        }
        Self { by_gloss }
    }

    /// Load a catalog from a JSON file (array of entries).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&content).context("Failed to parse catalog file as JSON")?;
        Ok(Self::from_entries(entries))
    }

    /// Number of distinct glosses with at least one segment.
    pub fn len(&self) -> usize {
        self.by_gloss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gloss.is_empty()
    }
}

#[async_trait]
impl SegmentCatalog for JsonCatalog {
    async fn lookup(&self, gloss_id: &str) -> Vec<CatalogEntry> {
        self.by_gloss.get(gloss_id).cloned().unwrap_or_default()
    }
}

/// Tie-break policy when a gloss has several segment variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantPreference {
    /// Take the catalog's first candidate.
    First,
    /// Prefer a candidate tagged with this region, falling back to first.
    Region(String),
}

impl VariantPreference {
    /// Parse the config string: "first" (or empty) means first, anything
    /// else is a region code.
    pub fn from_config(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("first") {
            VariantPreference::First
        } else {
            VariantPreference::Region(value.to_string())
        }
    }

    fn select<'a>(&self, candidates: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
        match self {
            VariantPreference::First => candidates.first(),
            VariantPreference::Region(region) => candidates
                .iter()
                .find(|c| c.region.as_deref() == Some(region.as_str()))
                .or_else(|| candidates.first()),
        }
    }
}

/// Maps gloss sequences to segment plans against a shared catalog.
pub struct SegmentResolver {
    catalog: Arc<dyn SegmentCatalog>,
    preference: VariantPreference,
}

impl SegmentResolver {
    pub fn new(catalog: Arc<dyn SegmentCatalog>, preference: VariantPreference) -> Self {
        Self {
            catalog,
            preference,
        }
    }

    /// Resolve every token to a segment reference.
    ///
    /// Never fails and never changes sequence length; misses become
    /// [`SegmentRef::Unresolved`] in place.
    pub async fn resolve(&self, sequence: &GlossSequence) -> SegmentPlan {
        let mut plan = SegmentPlan::with_capacity(sequence.len());

        for token in sequence {
            let gloss_id = match token {
                GlossToken::Sign { id, .. } => id.as_str(),
                GlossToken::Fingerspell { .. } => FINGERSPELL_GLOSS,
            };

            let candidates = self.catalog.lookup(gloss_id).await;
            match self.preference.select(&candidates) {
                Some(entry) => plan.push(SegmentRef::Resolved {
                    segment_id: entry.segment_id.clone(),
                    uri: entry.uri.clone(),
                }),
                None => plan.push(SegmentRef::Unresolved {
                    token: token.clone(),
                }),
            }
        }

        debug!(
            glosses = sequence.len(),
            resolved = plan.iter().filter(|r| r.is_resolved()).count(),
            "Resolved gloss sequence to segment plan"
        );
        plan
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
