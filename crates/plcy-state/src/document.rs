//! # Policy Documents
//!
//! A [`Document`] is a named, slugged legal policy (e.g., "Terms of
//! Service") grouping all of its versions across locales.
//!
//! ## Derived fields
//!
//! `status` and `active_version_id` are caches over the version set, never
//! independently mutable. [`Document::recompute`] rebuilds both and runs
//! inside the same commit as any version-state change, so the cached
//! summary can never drift from the versions it summarizes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use plcy_core::{DocumentId, Locale, PolicyCategory, Role, Slug, Timestamp, VersionId};

use crate::version::Version;

// ─── Document Status ─────────────────────────────────────────────────

/// The derived lifecycle summary of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// No locale has an active version yet (including brand-new documents
    /// with no versions at all).
    Draft,
    /// At least one locale has an active version.
    Active,
    /// Versions exist and every one of them is archived.
    Archived,
}

impl DocumentStatus {
    /// The canonical state name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Document ────────────────────────────────────────────────────────

/// A named policy document spanning locales.
///
/// Versions are exclusively owned: they are created through the document
/// and deleted only by cascading document deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: DocumentId,
    /// URL-safe handle, unique across all documents.
    pub slug: Slug,
    /// Human-readable title.
    pub title: String,
    /// Legal category.
    pub category: PolicyCategory,
    /// Deployment region this document applies to, if scoped.
    pub region: Option<String>,
    /// The locale whose active version is surfaced as the document-level
    /// summary ([`Document::active_version_id`]).
    pub default_locale: Locale,
    /// Short description shown in the admin console.
    pub summary: String,
    /// Marketplace roles this document is shown to.
    pub audience_roles: BTreeSet<Role>,
    /// Marketplace roles allowed to edit this document.
    pub editor_roles: BTreeSet<Role>,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Free-form metadata (contact email, hero image URL, review cadence
    /// in days, ...). Keys are collaborator-defined.
    pub metadata: BTreeMap<String, String>,
    /// Derived lifecycle summary. See [`Document::recompute`].
    pub status: DocumentStatus,
    /// The active version for [`Document::default_locale`], if any.
    /// Other locales' active versions are tracked on the version records
    /// themselves, not duplicated here.
    pub active_version_id: Option<VersionId>,
    /// When the document was created.
    pub created_at: Timestamp,
    /// When the document was last modified.
    pub updated_at: Timestamp,
}

impl Document {
    /// Create a new document with no versions, in [`DocumentStatus::Draft`].
    pub fn new(
        slug: Slug,
        title: impl Into<String>,
        category: PolicyCategory,
        default_locale: Locale,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: DocumentId::new(),
            slug,
            title: title.into(),
            category,
            region: None,
            default_locale,
            summary: String::new(),
            audience_roles: BTreeSet::new(),
            editor_roles: BTreeSet::new(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            status: DocumentStatus::Draft,
            active_version_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute the derived `status` and `active_version_id` from the
    /// document's version set.
    ///
    /// - `Active` if any locale has an active version;
    /// - `Draft` if no version is active but at least one is non-archived,
    ///   or if there are no versions at all;
    /// - `Archived` when versions exist and all are archived.
    ///
    /// `active_version_id` becomes the active version for the default
    /// locale, or `None` when that locale has no active version.
    pub fn recompute(&mut self, versions: &[Version]) {
        let any_active = versions.iter().any(|v| v.active);
        let any_live = versions.iter().any(|v| !v.is_archived());

        self.status = if any_active {
            DocumentStatus::Active
        } else if any_live || versions.is_empty() {
            DocumentStatus::Draft
        } else {
            DocumentStatus::Archived
        };

        self.active_version_id = versions
            .iter()
            .find(|v| v.active && v.locale == self.default_locale)
            .map(|v| v.id);
    }

    /// Mark the document as directly edited.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
