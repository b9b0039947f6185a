//! # Facade Error Taxonomy
//!
//! Every operation on [`crate::PolicyService`] returns [`PolicyError`]. The
//! variants fold the lower-layer errors into a small set of caller-facing
//! categories, and [`PolicyError::kind`] maps each category onto a stable
//! machine-readable code that transport layers can pass through unchanged.

use plcy_core::{TransitionError, ValidationError};
use plcy_store::StoreError;

/// Unified error type for all policy engine operations.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Input failed domain validation before any state was touched.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A lifecycle transition or state precondition was violated.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The write conflicted with a concurrent or pre-existing change.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced document or version does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistence backend failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl PolicyError {
    /// Stable machine-readable error code for this error.
    ///
    /// Codes are part of the public contract and never change for a given
    /// failure mode, regardless of how the message text evolves.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transition(TransitionError::IllegalTransition { .. }) => "ILLEGAL_TRANSITION",
            Self::Transition(TransitionError::InvalidState { .. }) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl From<StoreError> for PolicyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound(id) => Self::NotFound(format!("document {id}")),
            StoreError::VersionNotFound(id) => Self::NotFound(format!("version {id}")),
            StoreError::DuplicateSlug(slug) => {
                Self::Conflict(format!("slug '{slug}' is already in use"))
            }
            StoreError::TokenConflict {
                document_id,
                locale,
                ..
            } => Self::Conflict(format!(
                "concurrent activation change for document {document_id} locale {locale}"
            )),
            StoreError::RevisionConflict { document_id, .. } => {
                Self::Conflict(format!("concurrent change to document {document_id}"))
            }
            StoreError::Backend(msg) => Self::Persistence(msg),
        }
    }
}
