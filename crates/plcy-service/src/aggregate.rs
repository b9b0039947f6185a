//! The composite read model returned by facade operations.

use serde::Serialize;

use plcy_audit::AuditEvent;
use plcy_core::{Locale, VersionId};
use plcy_state::{Document, Version};

/// A document together with the optional expansions a caller asked for.
///
/// Mutating operations return the aggregate with `versions` populated so
/// callers always observe the post-commit state, including the derived
/// document fields, without a second read.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAggregate {
    /// The document record.
    pub document: Document,
    /// The document's versions ordered by `(locale, number)`, when
    /// requested or when returned from a mutation.
    pub versions: Option<Vec<Version>>,
    /// The first page of audit history, newest-first, when requested.
    pub audit: Option<Vec<AuditEvent>>,
    /// Whether this response was served from the read cache.
    pub from_cache: bool,
}

impl DocumentAggregate {
    /// Look up a version in the aggregate by id.
    pub fn version(&self, id: VersionId) -> Option<&Version> {
        self.versions.as_ref()?.iter().find(|v| v.id == id)
    }

    /// The active version for a locale, if the version set is present
    /// and that locale has one.
    pub fn active_version(&self, locale: &Locale) -> Option<&Version> {
        self.versions
            .as_ref()?
            .iter()
            .find(|v| v.active && v.locale == *locale)
    }
}
