//! Request payloads accepted by the service facade.
//!
//! These carry raw caller input (strings for slugs, locales, categories,
//! roles) and are validated into domain types at the facade boundary, so a
//! transport layer can deserialize straight into them.

use std::collections::BTreeMap;

use serde::Deserialize;

use plcy_core::Timestamp;
use plcy_state::VersionFields;

/// Payload for creating a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDocumentRequest {
    /// URL-safe handle, unique across all documents.
    pub slug: String,
    /// Human-readable title. Must be non-empty.
    pub title: String,
    /// Policy category name (`terms`, `privacy`, ...).
    pub category: String,
    /// The document's default locale tag.
    pub default_locale: String,
    /// Deployment region, if scoped.
    #[serde(default)]
    pub region: Option<String>,
    /// Short description shown in the admin console.
    #[serde(default)]
    pub summary: String,
    /// Marketplace roles this document is shown to.
    #[serde(default)]
    pub audience_roles: Vec<String>,
    /// Marketplace roles allowed to edit this document.
    #[serde(default)]
    pub editor_roles: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A partial update to a document. `None` fields are untouched; for
/// `region`, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    /// New slug, if changing. Uniqueness is enforced at commit.
    pub slug: Option<String>,
    /// New title, if changing. Must be non-empty.
    pub title: Option<String>,
    /// New category name, if changing.
    pub category: Option<String>,
    /// New default locale, if changing. Re-derives the document-level
    /// active version pointer.
    pub default_locale: Option<String>,
    /// New summary, if changing.
    pub summary: Option<String>,
    /// New region; `Some(None)` clears it.
    pub region: Option<Option<String>>,
    /// Replacement audience role set, if changing.
    pub audience_roles: Option<Vec<String>>,
    /// Replacement editor role set, if changing.
    pub editor_roles: Option<Vec<String>>,
    /// Replacement tag set, if changing.
    pub tags: Option<Vec<String>>,
    /// Replacement metadata map, if changing.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Payload for creating a draft version under a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVersionRequest {
    /// The locale this revision is written in.
    pub locale: String,
    /// Short human-readable summary of this revision.
    #[serde(default)]
    pub summary: String,
    /// What changed relative to the previous version.
    #[serde(default)]
    pub change_summary: String,
    /// The policy text itself. Must be non-empty.
    pub content: String,
    /// Optional link to an externally hosted rendition.
    #[serde(default)]
    pub external_url: Option<String>,
    /// When the version takes legal effect, if already known.
    #[serde(default)]
    pub effective_at: Option<Timestamp>,
}

impl CreateVersionRequest {
    /// The editor-supplied field bundle, leaving the locale behind.
    pub(crate) fn into_fields(self) -> VersionFields {
        VersionFields {
            summary: self.summary,
            change_summary: self.change_summary,
            content: self.content,
            external_url: self.external_url,
            effective_at: self.effective_at,
        }
    }
}

/// Read options for document fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDocumentOptions {
    /// Include the document's full version set.
    pub include_versions: bool,
    /// Include the first page of the document's audit history.
    pub include_audit: bool,
    /// Serve from the read cache when a fresh-enough entry exists.
    /// Audit history is never cached, so `include_audit` bypasses this.
    pub allow_cached: bool,
}

impl GetDocumentOptions {
    /// Include the version set.
    pub fn with_versions(mut self) -> Self {
        self.include_versions = true;
        self
    }

    /// Include the first page of audit history.
    pub fn with_audit(mut self) -> Self {
        self.include_audit = true;
        self
    }

    /// Permit a cached response.
    pub fn cached(mut self) -> Self {
        self.allow_cached = true;
        self
    }
}
