//! Store trait, commit write sets, and storage errors.

use thiserror::Error;

use plcy_core::{DocumentId, Locale, Slug, VersionId};
use plcy_state::{Document, Version};

/// Errors from the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document with the given identifier.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// No version with the given identifier.
    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// Another document already owns the slug.
    #[error("slug already in use: {0}")]
    DuplicateSlug(Slug),

    /// The activation token moved between read and commit — a concurrent
    /// writer won the race for this `(document, locale)`.
    #[error(
        "activation token conflict for document {document_id} locale {locale}: \
         expected {expected}, found {actual}"
    )]
    TokenConflict {
        /// The document whose activation was contended.
        document_id: DocumentId,
        /// The contended locale.
        locale: Locale,
        /// The token value the writer prepared against.
        expected: u64,
        /// The token value actually in the store.
        actual: u64,
    },

    /// The document revision moved between read and commit — a concurrent
    /// writer changed the document or one of its versions.
    #[error(
        "revision conflict for document {document_id}: \
         expected {expected}, found {actual}"
    )]
    RevisionConflict {
        /// The contended document.
        document_id: DocumentId,
        /// The revision the writer prepared against.
        expected: u64,
        /// The revision actually in the store.
        actual: u64,
    },

    /// Storage engine failure (connection loss, constraint violation, ...).
    /// The operation is not committed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// An activation-token compare-and-swap, part of a [`Commit`].
///
/// The commit succeeds only if the stored token for `(document_id, locale)`
/// still equals `expected`; on success the token is bumped by one.
#[derive(Debug, Clone)]
pub struct TokenSwap {
    /// The document whose activation state the commit changes.
    pub document_id: DocumentId,
    /// The locale whose activation state the commit changes.
    pub locale: Locale,
    /// The token value observed when the write was prepared.
    pub expected: u64,
}

/// A document-revision compare-and-swap, part of a [`Commit`].
///
/// The commit succeeds only if the stored revision for `document_id` still
/// equals `expected`. Every committed write set that touches a document (the
/// record itself or any of its versions) bumps that document's revision, so
/// a writer that prepared against a snapshot older than an interleaved
/// commit loses here instead of silently overwriting it.
#[derive(Debug, Clone)]
pub struct RevisionSwap {
    /// The document whose state the commit changes.
    pub document_id: DocumentId,
    /// The revision observed when the write was prepared.
    pub expected: u64,
}

/// The all-or-nothing write set of one logical transaction.
///
/// Records are upserts keyed by id; every referenced document must already
/// exist (document creation goes through
/// [`PolicyStore::insert_document`], which also enforces slug uniqueness).
///
/// The document's derived fields (`status`, `active_version_id`,
/// `updated_at` excluded) are not trusted from the caller: after applying
/// the write set the store recomputes them from the authoritative version
/// set, under the same lock. A caller therefore never needs to include the
/// document record just to refresh derived state.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    /// Updated document record, if the transaction edits its own fields.
    pub document: Option<Document>,
    /// Updated or newly created version records.
    pub versions: Vec<Version>,
    /// Optional activation-token compare-and-swap guarding the write set.
    pub token: Option<TokenSwap>,
    /// Optional document-revision compare-and-swap guarding the write set.
    pub revision: Option<RevisionSwap>,
}

impl Commit {
    /// An empty write set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include an updated document record.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Include an updated or new version record.
    pub fn with_version(mut self, version: Version) -> Self {
        self.versions.push(version);
        self
    }

    /// Guard the write set with an activation-token compare-and-swap.
    pub fn expect_token(mut self, document_id: DocumentId, locale: Locale, expected: u64) -> Self {
        self.token = Some(TokenSwap {
            document_id,
            locale,
            expected,
        });
        self
    }

    /// Guard the write set with a document-revision compare-and-swap.
    pub fn expect_revision(mut self, document_id: DocumentId, expected: u64) -> Self {
        self.revision = Some(RevisionSwap {
            document_id,
            expected,
        });
        self
    }
}

/// The persistence interface the service layer is written against.
///
/// All methods are synchronous; implementations are expected to be cheap
/// to clone (shared handles) and safe to call from multiple threads.
/// Reads never block behind writers beyond the storage engine's own
/// read/write coordination.
pub trait PolicyStore: Send + Sync {
    /// Insert a brand-new document.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateSlug`] if another document owns the slug.
    fn insert_document(&self, document: Document) -> Result<(), StoreError>;

    /// Fetch a document by id.
    fn document(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Fetch a document by slug.
    fn document_by_slug(&self, slug: &Slug) -> Result<Option<Document>, StoreError>;

    /// List all documents in creation order.
    fn list_documents(&self) -> Result<Vec<Document>, StoreError>;

    /// Fetch a version by id.
    fn version(&self, id: VersionId) -> Result<Option<Version>, StoreError>;

    /// List a document's versions ordered by `(locale, number)`.
    fn versions_for(&self, document_id: DocumentId) -> Result<Vec<Version>, StoreError>;

    /// Allocate the next version number for `(document, locale)`.
    ///
    /// Numbers start at 1, strictly increase, and are never reused — an
    /// allocation burned by a transaction that subsequently fails stays
    /// burned rather than risking reuse.
    fn next_version_number(
        &self,
        document_id: DocumentId,
        locale: &Locale,
    ) -> Result<u32, StoreError>;

    /// Read the current activation token for `(document, locale)`.
    /// Locales that have never been activated read as 0.
    fn activation_token(&self, document_id: DocumentId, locale: &Locale)
        -> Result<u64, StoreError>;

    /// Read the current revision for a document. Every committed write set
    /// touching the document bumps it; never-touched documents read as 0.
    ///
    /// A writer that reads the revision before loading the records it will
    /// rewrite, and guards its commit with [`Commit::expect_revision`], is
    /// serialized against every other guarded writer for the same document.
    fn document_revision(&self, document_id: DocumentId) -> Result<u64, StoreError>;

    /// Apply a write set atomically.
    ///
    /// After the upserts land, the derived fields of every touched document
    /// (`status`, `active_version_id`) are recomputed from the stored
    /// version set and the document's revision is bumped, all under the
    /// same write lock.
    ///
    /// # Errors
    ///
    /// [`StoreError::TokenConflict`] if the commit's token guard fails;
    /// [`StoreError::RevisionConflict`] if its revision guard fails;
    /// [`StoreError::DocumentNotFound`] if an upsert references a document
    /// that does not exist; [`StoreError::DuplicateSlug`] if a document
    /// update would steal another document's slug. On any error nothing
    /// is applied.
    fn commit(&self, commit: Commit) -> Result<(), StoreError>;

    /// Delete a document and, by cascade, every version it owns.
    ///
    /// Returns the removed document, or `None` if the id was unknown.
    /// This cascade is the only deletion path for versions.
    fn remove_document(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;
}
