//! In-memory [`PolicyStore`] implementation.
//!
//! Thread-safe, cheap-to-clone handle over a single `parking_lot::RwLock`.
//! All operations are synchronous and the lock is never held across await
//! points (there are none — the core is synchronous). `parking_lot` locks
//! are non-poisonable, so a panicking writer does not permanently corrupt
//! the store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use plcy_core::{DocumentId, Locale, Slug, VersionId};
use plcy_state::{Document, Version};

use crate::store::{Commit, PolicyStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentId, Document>,
    /// Document ids in creation order, for stable listing.
    creation_order: Vec<DocumentId>,
    versions: HashMap<VersionId, Version>,
    /// Version ids per document, in creation order.
    by_document: HashMap<DocumentId, Vec<VersionId>>,
    /// Next-number bookkeeping per `(document, locale)`. Only ever grows.
    counters: HashMap<(DocumentId, Locale), u32>,
    /// Activation revision tokens per `(document, locale)`.
    tokens: HashMap<(DocumentId, Locale), u64>,
    /// Per-document revision counters, bumped on every commit that touches
    /// the document or one of its versions.
    revisions: HashMap<DocumentId, u64>,
}

/// In-memory policy store.
///
/// Clones share the same underlying state.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    inner: Arc<RwLock<Inner>>,
}

impl Clone for InMemoryPolicyStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl InMemoryPolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored.
    pub fn document_count(&self) -> usize {
        self.inner.read().documents.len()
    }

    /// Number of versions currently stored, across all documents.
    pub fn version_count(&self) -> usize {
        self.inner.read().versions.len()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner
            .documents
            .values()
            .any(|existing| existing.slug == document.slug)
        {
            return Err(StoreError::DuplicateSlug(document.slug));
        }
        let id = document.id;
        inner.documents.insert(id, document);
        inner.creation_order.push(id);
        inner.by_document.entry(id).or_default();
        Ok(())
    }

    fn document(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().documents.get(&id).cloned())
    }

    fn document_by_slug(&self, slug: &Slug) -> Result<Option<Document>, StoreError> {
        Ok(self
            .inner
            .read()
            .documents
            .values()
            .find(|d| &d.slug == slug)
            .cloned())
    }

    fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .creation_order
            .iter()
            .filter_map(|id| inner.documents.get(id).cloned())
            .collect())
    }

    fn version(&self, id: VersionId) -> Result<Option<Version>, StoreError> {
        Ok(self.inner.read().versions.get(&id).cloned())
    }

    fn versions_for(&self, document_id: DocumentId) -> Result<Vec<Version>, StoreError> {
        let inner = self.inner.read();
        let mut versions: Vec<Version> = inner
            .by_document
            .get(&document_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.versions.get(id).cloned())
            .collect();
        versions.sort_by(|a, b| (&a.locale, a.number).cmp(&(&b.locale, b.number)));
        Ok(versions)
    }

    fn next_version_number(
        &self,
        document_id: DocumentId,
        locale: &Locale,
    ) -> Result<u32, StoreError> {
        let mut inner = self.inner.write();
        if !inner.documents.contains_key(&document_id) {
            return Err(StoreError::DocumentNotFound(document_id));
        }
        let counter = inner
            .counters
            .entry((document_id, locale.clone()))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn activation_token(
        &self,
        document_id: DocumentId,
        locale: &Locale,
    ) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .read()
            .tokens
            .get(&(document_id, locale.clone()))
            .copied()
            .unwrap_or(0))
    }

    fn document_revision(&self, document_id: DocumentId) -> Result<u64, StoreError> {
        Ok(self
            .inner
            .read()
            .revisions
            .get(&document_id)
            .copied()
            .unwrap_or(0))
    }

    fn commit(&self, commit: Commit) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        // Validate the entire write set before touching anything.
        if let Some(swap) = &commit.revision {
            let actual = inner.revisions.get(&swap.document_id).copied().unwrap_or(0);
            if actual != swap.expected {
                return Err(StoreError::RevisionConflict {
                    document_id: swap.document_id,
                    expected: swap.expected,
                    actual,
                });
            }
        }
        if let Some(swap) = &commit.token {
            let actual = inner
                .tokens
                .get(&(swap.document_id, swap.locale.clone()))
                .copied()
                .unwrap_or(0);
            if actual != swap.expected {
                return Err(StoreError::TokenConflict {
                    document_id: swap.document_id,
                    locale: swap.locale.clone(),
                    expected: swap.expected,
                    actual,
                });
            }
        }
        if let Some(document) = &commit.document {
            if !inner.documents.contains_key(&document.id) {
                return Err(StoreError::DocumentNotFound(document.id));
            }
            if inner
                .documents
                .values()
                .any(|other| other.id != document.id && other.slug == document.slug)
            {
                return Err(StoreError::DuplicateSlug(document.slug.clone()));
            }
        }
        for version in &commit.versions {
            if !inner.documents.contains_key(&version.document_id) {
                return Err(StoreError::DocumentNotFound(version.document_id));
            }
        }

        // Apply.
        let mut touched: Vec<DocumentId> = Vec::new();
        if let Some(document) = commit.document {
            touched.push(document.id);
            inner.documents.insert(document.id, document);
        }
        for version in commit.versions {
            let id = version.id;
            let document_id = version.document_id;
            if !touched.contains(&document_id) {
                touched.push(document_id);
            }
            if inner.versions.insert(id, version).is_none() {
                inner.by_document.entry(document_id).or_default().push(id);
            }
        }
        if let Some(swap) = commit.token {
            *inner
                .tokens
                .entry((swap.document_id, swap.locale))
                .or_insert(0) += 1;
        }

        // Derived document fields come from the authoritative version set,
        // never from the caller's snapshot, so concurrent writers for
        // different locales cannot roll each other's recompute back.
        for document_id in touched {
            let versions: Vec<Version> = inner
                .by_document
                .get(&document_id)
                .into_iter()
                .flatten()
                .filter_map(|id| inner.versions.get(id).cloned())
                .collect();
            if let Some(document) = inner.documents.get_mut(&document_id) {
                document.recompute(&versions);
            }
            *inner.revisions.entry(document_id).or_insert(0) += 1;
        }
        Ok(())
    }

    fn remove_document(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.write();
        let removed = inner.documents.remove(&id);
        if removed.is_some() {
            inner.creation_order.retain(|d| *d != id);
            if let Some(version_ids) = inner.by_document.remove(&id) {
                for version_id in version_ids {
                    inner.versions.remove(&version_id);
                }
            }
            inner.counters.retain(|(doc, _), _| *doc != id);
            inner.tokens.retain(|(doc, _), _| *doc != id);
            inner.revisions.remove(&id);
        }
        Ok(removed)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use plcy_core::{ActorId, PolicyCategory};
    use plcy_state::{TransitionEvidence, VersionFields, VersionStatus};

    fn make_store() -> InMemoryPolicyStore {
        InMemoryPolicyStore::new()
    }

    fn make_document(slug: &str) -> Document {
        Document::new(
            Slug::new(slug).unwrap(),
            "Terms of Service",
            PolicyCategory::Terms,
            Locale::new("en").unwrap(),
        )
    }

    fn make_version(document_id: DocumentId, locale: &str, number: u32) -> Version {
        Version::new(
            document_id,
            Locale::new(locale).unwrap(),
            number,
            VersionFields {
                summary: "rev".to_string(),
                change_summary: String::new(),
                content: "content".to_string(),
                external_url: None,
                effective_at: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_and_fetch_document() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        assert!(store.document(id).unwrap().is_some());
        assert!(store
            .document_by_slug(&Slug::new("terms").unwrap())
            .unwrap()
            .is_some());
        assert!(store.document(DocumentId::new()).unwrap().is_none());
    }

    #[test]
    fn insert_rejects_duplicate_slug() {
        let store = make_store();
        store.insert_document(make_document("terms")).unwrap();
        let err = store.insert_document(make_document("terms")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSlug(_)));
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn list_documents_in_creation_order() {
        let store = make_store();
        let first = make_document("terms");
        let second = make_document("privacy");
        let (a, b) = (first.id, second.id);
        store.insert_document(first).unwrap();
        store.insert_document(second).unwrap();

        let listed: Vec<DocumentId> = store
            .list_documents()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(listed, vec![a, b]);
    }

    #[test]
    fn version_numbers_allocate_per_locale() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        let en = Locale::new("en").unwrap();
        let fi = Locale::new("fi").unwrap();
        assert_eq!(store.next_version_number(id, &en).unwrap(), 1);
        assert_eq!(store.next_version_number(id, &en).unwrap(), 2);
        assert_eq!(store.next_version_number(id, &fi).unwrap(), 1);
        assert_eq!(store.next_version_number(id, &en).unwrap(), 3);
    }

    #[test]
    fn version_number_allocation_requires_document() {
        let store = make_store();
        let err = store
            .next_version_number(DocumentId::new(), &Locale::new("en").unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));
    }

    #[test]
    fn commit_upserts_versions_and_orders_listing() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        let fi = make_version(id, "fi", 1);
        let en1 = make_version(id, "en", 1);
        let en2 = make_version(id, "en", 2);
        store
            .commit(
                Commit::new()
                    .with_version(en2.clone())
                    .with_version(fi.clone())
                    .with_version(en1.clone()),
            )
            .unwrap();

        let listed: Vec<VersionId> = store
            .versions_for(id)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(listed, vec![en1.id, en2.id, fi.id]);
    }

    #[test]
    fn commit_rejects_unknown_document() {
        let store = make_store();
        let orphan = make_version(DocumentId::new(), "en", 1);
        let err = store
            .commit(Commit::new().with_version(orphan))
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn commit_rejects_slug_theft() {
        let store = make_store();
        store.insert_document(make_document("terms")).unwrap();
        let mut privacy = make_document("privacy");
        store.insert_document(privacy.clone()).unwrap();

        privacy.slug = Slug::new("terms").unwrap();
        let err = store
            .commit(Commit::new().with_document(privacy))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSlug(_)));
    }

    #[test]
    fn token_cas_rejects_stale_writer() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();
        let en = Locale::new("en").unwrap();

        assert_eq!(store.activation_token(id, &en).unwrap(), 0);

        // First writer prepared against token 0 and wins.
        store
            .commit(Commit::new().expect_token(id, en.clone(), 0))
            .unwrap();
        assert_eq!(store.activation_token(id, &en).unwrap(), 1);

        // Second writer also prepared against token 0 and must lose.
        let err = store
            .commit(Commit::new().expect_token(id, en.clone(), 0))
            .unwrap_err();
        match err {
            StoreError::TokenConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected TokenConflict, got: {other:?}"),
        }
    }

    #[test]
    fn failed_token_check_applies_nothing() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();
        let en = Locale::new("en").unwrap();

        let version = make_version(id, "en", 1);
        let err = store
            .commit(
                Commit::new()
                    .with_version(version)
                    .expect_token(id, en.clone(), 7),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::TokenConflict { .. }));
        // The version upsert must not have landed.
        assert_eq!(store.version_count(), 0);
        assert_eq!(store.activation_token(id, &en).unwrap(), 0);
    }

    fn publish(version: &mut Version) {
        let actor = ActorId::new("admin").unwrap();
        for target in [
            VersionStatus::InReview,
            VersionStatus::Approved,
            VersionStatus::Published,
        ] {
            version
                .transition(target, TransitionEvidence::new(actor.clone(), "step"))
                .unwrap();
        }
    }

    #[test]
    fn commit_recomputes_document_from_stored_versions() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        let mut version = make_version(id, "en", 1);
        publish(&mut version);
        version.mark_active();
        store
            .commit(Commit::new().with_version(version.clone()))
            .unwrap();

        // The write set never carried the document, yet its derived fields
        // reflect the committed version.
        let document = store.document(id).unwrap().unwrap();
        assert_eq!(document.status, plcy_state::DocumentStatus::Active);
        assert_eq!(document.active_version_id, Some(version.id));
    }

    #[test]
    fn stale_document_snapshot_cannot_roll_back_activation() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        let mut en = make_version(id, "en", 1);
        publish(&mut en);
        let mut fi = make_version(id, "fi", 1);
        publish(&mut fi);
        store
            .commit(Commit::new().with_version(en.clone()).with_version(fi.clone()))
            .unwrap();

        // Writer A snapshots the document before B's activation lands.
        let snapshot = store.document(id).unwrap().unwrap();

        // Writer B activates the default-locale version.
        en.mark_active();
        store.commit(Commit::new().with_version(en.clone())).unwrap();

        // Writer A commits its pre-activation snapshot together with the
        // other locale's activation.
        fi.mark_active();
        store
            .commit(Commit::new().with_document(snapshot).with_version(fi))
            .unwrap();

        let document = store.document(id).unwrap().unwrap();
        assert_eq!(document.status, plcy_state::DocumentStatus::Active);
        assert_eq!(document.active_version_id, Some(en.id));
    }

    #[test]
    fn revision_cas_rejects_stale_writer() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();
        assert_eq!(store.document_revision(id).unwrap(), 0);

        // First writer prepared against revision 0 and wins.
        store
            .commit(
                Commit::new()
                    .with_version(make_version(id, "en", 1))
                    .expect_revision(id, 0),
            )
            .unwrap();
        assert_eq!(store.document_revision(id).unwrap(), 1);

        // Second writer also prepared against revision 0 and must lose,
        // applying nothing.
        let err = store
            .commit(
                Commit::new()
                    .with_version(make_version(id, "en", 2))
                    .expect_revision(id, 0),
            )
            .unwrap_err();
        match err {
            StoreError::RevisionConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected RevisionConflict, got: {other:?}"),
        }
        assert_eq!(store.version_count(), 1);
    }

    #[test]
    fn remove_document_cascades_to_versions() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();
        let version = make_version(id, "en", 1);
        let version_id = version.id;
        store.commit(Commit::new().with_version(version)).unwrap();

        let removed = store.remove_document(id).unwrap();
        assert!(removed.is_some());
        assert!(store.version(version_id).unwrap().is_none());
        assert_eq!(store.document_count(), 0);
        assert_eq!(store.version_count(), 0);

        assert!(store.remove_document(id).unwrap().is_none());
    }

    #[test]
    fn clones_share_state() {
        let store = make_store();
        let handle = store.clone();
        handle.insert_document(make_document("terms")).unwrap();
        assert_eq!(store.document_count(), 1);
    }

    #[test]
    fn updated_version_does_not_duplicate_index_entry() {
        let store = make_store();
        let doc = make_document("terms");
        let id = doc.id;
        store.insert_document(doc).unwrap();

        let mut version = make_version(id, "en", 1);
        store
            .commit(Commit::new().with_version(version.clone()))
            .unwrap();

        version
            .transition(
                plcy_state::VersionStatus::InReview,
                TransitionEvidence::new(ActorId::new("admin").unwrap(), "submitted"),
            )
            .unwrap();
        store
            .commit(Commit::new().with_version(version.clone()))
            .unwrap();

        let listed = store.versions_for(id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, plcy_state::VersionStatus::InReview);
    }
}
