//! # Activation Coordinator
//!
//! Owns the invariant that at most one version per `(document, locale)` is
//! active at any instant, across concurrent administrators.
//!
//! ## Protocol
//!
//! Both activation and archival follow the same read-validate-commit shape:
//!
//! 1. read the document revision, then the version set — the snapshot is
//!    never older than the revision it was prepared against;
//! 2. prepare the write set: flip the target's marker and clear (or, under
//!    supersession, archive) the previous holder's;
//! 3. commit guarded by the revision and by the activation token for the
//!    contended `(document, locale)`. The store applies the write set only
//!    if both are unmoved, bumps them, and recomputes the document's
//!    derived fields from the version set it now holds.
//!
//! A writer that loses either race gets a conflict back; the winner's
//! state is never partially overwritten. The document record itself is not
//! part of the write set, so activations for different locales of the same
//! document can never roll back each other's recompute. The superseded
//! version stays published but inactive unless the caller asked for
//! supersession, so it can be reactivated later without burning a new
//! number.

use std::sync::Arc;

use plcy_core::VersionId;
use plcy_state::{Document, TransitionEvidence, Version, VersionStatus};
use plcy_store::{Commit, PolicyStore};

use crate::error::PolicyError;

/// The result of an activation-state change.
#[derive(Debug, Clone)]
pub struct ActivationOutcome {
    /// The version as committed.
    pub version: Version,
    /// The document as committed, derived fields recomputed.
    pub document: Document,
    /// The version whose active marker was cleared, if activation
    /// superseded one.
    pub previous_active: Option<VersionId>,
    /// Whether the target held the active marker before the operation.
    pub was_active: bool,
    /// False when the operation was an idempotent no-op (already active,
    /// already archived) and nothing was committed.
    pub changed: bool,
}

/// Serializes activation-state changes via document-revision and
/// activation-token compare-and-swap. See the module docs.
pub struct ActivationCoordinator<S: PolicyStore> {
    store: Arc<S>,
}

impl<S: PolicyStore> Clone for ActivationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PolicyStore> ActivationCoordinator<S> {
    /// Create a coordinator over the given store handle.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Make `version_id` the active version for its locale.
    ///
    /// The target must be published. Activating the already-active version
    /// is a no-op success. A previously active version for the locale loses
    /// its marker in the same commit; with `supersede` evidence it is
    /// additionally archived, otherwise it stays published and can be
    /// reactivated later.
    ///
    /// # Errors
    ///
    /// [`PolicyError::NotFound`] for an unknown version or document;
    /// [`PolicyError::Transition`] (invalid state) when the target is not
    /// published; [`PolicyError::Conflict`] when a concurrent writer for
    /// the same document wins the revision or token race.
    pub fn activate(
        &self,
        version_id: VersionId,
        supersede: Option<TransitionEvidence>,
    ) -> Result<ActivationOutcome, PolicyError> {
        let locator = self.require_version(version_id)?;
        let document = self.require_document(&locator)?;

        let revision = self.store.document_revision(document.id)?;
        let mut versions = self.store.versions_for(document.id)?;
        let idx = versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| PolicyError::NotFound(format!("version {version_id}")))?;

        if versions[idx].active {
            return Ok(ActivationOutcome {
                version: versions.swap_remove(idx),
                document,
                previous_active: None,
                was_active: true,
                changed: false,
            });
        }
        if versions[idx].status != VersionStatus::Published {
            return Err(plcy_core::TransitionError::InvalidState {
                current: versions[idx].status.to_string(),
                operation: "activate version".to_string(),
            }
            .into());
        }

        let locale = versions[idx].locale.clone();
        let token = self.store.activation_token(document.id, &locale)?;

        versions[idx].mark_active();
        let mut previous_active = None;
        for v in versions.iter_mut() {
            if v.id != version_id && v.active && v.locale == locale {
                previous_active = Some(v.id);
                match &supersede {
                    Some(evidence) => v.archive(evidence.clone())?,
                    None => v.clear_active(),
                }
            }
        }
        let activated = versions[idx].clone();

        let mut commit = Commit::new()
            .with_version(activated.clone())
            .expect_revision(document.id, revision)
            .expect_token(document.id, locale, token);
        if let Some(prev_id) = previous_active {
            if let Some(prev) = versions.iter().find(|v| v.id == prev_id) {
                commit = commit.with_version(prev.clone());
            }
        }
        self.store.commit(commit)?;

        // Derived fields were recomputed by the store; re-read the record.
        let document = self.require_document(&activated)?;

        Ok(ActivationOutcome {
            version: activated,
            document,
            previous_active,
            was_active: false,
            changed: true,
        })
    }

    /// Archive `version_id`, clearing its active marker in the same commit
    /// when it holds one. Archiving an archived version is a no-op
    /// success. The locale is never auto-promoted to another version.
    ///
    /// # Errors
    ///
    /// [`PolicyError::NotFound`] for an unknown version or document;
    /// [`PolicyError::Conflict`] when a concurrent writer for the same
    /// document wins the revision or token race.
    pub fn archive(
        &self,
        version_id: VersionId,
        evidence: TransitionEvidence,
    ) -> Result<ActivationOutcome, PolicyError> {
        let locator = self.require_version(version_id)?;
        let document = self.require_document(&locator)?;

        let revision = self.store.document_revision(document.id)?;
        let mut versions = self.store.versions_for(document.id)?;
        let idx = versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| PolicyError::NotFound(format!("version {version_id}")))?;

        if versions[idx].is_archived() {
            return Ok(ActivationOutcome {
                version: versions.swap_remove(idx),
                document,
                previous_active: None,
                was_active: false,
                changed: false,
            });
        }

        let was_active = versions[idx].active;
        let locale = versions[idx].locale.clone();
        let token = self.store.activation_token(document.id, &locale)?;

        versions[idx].archive(evidence)?;
        let archived = versions[idx].clone();

        self.store.commit(
            Commit::new()
                .with_version(archived.clone())
                .expect_revision(document.id, revision)
                .expect_token(document.id, locale, token),
        )?;

        let document = self.require_document(&archived)?;

        Ok(ActivationOutcome {
            version: archived,
            document,
            previous_active: None,
            was_active,
            changed: true,
        })
    }

    fn require_version(&self, version_id: VersionId) -> Result<Version, PolicyError> {
        self.store
            .version(version_id)?
            .ok_or_else(|| PolicyError::NotFound(format!("version {version_id}")))
    }

    fn require_document(&self, version: &Version) -> Result<Document, PolicyError> {
        self.store
            .document(version.document_id)?
            .ok_or_else(|| PolicyError::NotFound(format!("document {}", version.document_id)))
    }
}
