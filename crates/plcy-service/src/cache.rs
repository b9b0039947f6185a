//! Slug-keyed read cache for document aggregates.
//!
//! Entries hold a document and its version set as of the last uncached
//! read. Every successful mutation invalidates the touched slug(s), so a
//! cached response is at worst as stale as the most recent read — callers
//! opt in per request and get a `from_cache` flag back. Audit history is
//! never cached.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use plcy_core::Slug;
use plcy_state::{Document, Version};

/// A cached document snapshot.
#[derive(Debug)]
pub(crate) struct CachedDocument {
    pub document: Document,
    pub versions: Vec<Version>,
}

/// Shared slug-keyed cache handle.
#[derive(Clone, Default)]
pub(crate) struct ReadCache {
    entries: Arc<RwLock<HashMap<Slug, Arc<CachedDocument>>>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &Slug) -> Option<Arc<CachedDocument>> {
        self.entries.read().get(slug).cloned()
    }

    pub fn put(&self, document: Document, versions: Vec<Version>) {
        let slug = document.slug.clone();
        let entry = Arc::new(CachedDocument { document, versions });
        self.entries.write().insert(slug, entry);
    }

    pub fn invalidate(&self, slug: &Slug) {
        self.entries.write().remove(slug);
    }
}
