//! # plcy-service — Policy Engine Facade
//!
//! The single entry point callers (transport layers, the admin console,
//! tests) talk to. [`PolicyService`] composes the pieces from the lower
//! crates:
//!
//! - the lifecycle state machine (`plcy-state`) for version and document
//!   semantics;
//! - a [`PolicyStore`](plcy_store::PolicyStore) for atomic persistence;
//! - the [`ActivationCoordinator`] for the one-active-version-per-locale
//!   invariant under concurrency;
//! - an [`AuditRecorder`](plcy_audit::AuditRecorder) for the best-effort
//!   hash-chained audit trail;
//! - a slug-keyed read cache with explicit, per-request opt-in.
//!
//! ## Transaction shape
//!
//! Every mutating operation is one logical transaction:
//!
//! ```text
//! read revision → validate against fresh records → apply state change
//!               → commit atomically under the revision guard
//!               → record one audit event → invalidate cache
//! ```
//!
//! Concurrent writers for the same document are serialized by the guard;
//! the loser surfaces `CONFLICT` instead of overwriting the winner. The
//! store recomputes derived document fields from the version set it holds
//! at commit time. Audit recording happens after the commit and never
//! fails the mutation; a sink outage parks the event for reconciliation
//! instead.
//!
//! ## Error contract
//!
//! All operations return [`PolicyError`], whose [`kind`](PolicyError::kind)
//! is a stable machine-readable code: `VALIDATION_ERROR`,
//! `ILLEGAL_TRANSITION`, `INVALID_STATE`, `CONFLICT`, `NOT_FOUND`, or
//! `PERSISTENCE_ERROR`.

pub mod activation;
pub mod aggregate;
pub mod error;
pub mod requests;
pub mod service;

mod cache;

pub use activation::{ActivationCoordinator, ActivationOutcome};
pub use aggregate::DocumentAggregate;
pub use error::PolicyError;
pub use requests::{
    CreateDocumentRequest, CreateVersionRequest, DocumentPatch, GetDocumentOptions,
};
pub use service::PolicyService;
