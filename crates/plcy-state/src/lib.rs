//! # plcy-state — Policy Document and Version Lifecycle
//!
//! Implements the records at the heart of the policy engine and the state
//! machine that governs them.
//!
//! - **Version** (`version.rs`): one localized revision of a policy
//!   document, with the `Draft → InReview → Approved → Published →
//!   Archived` lifecycle. Invalid transitions are rejected with structured
//!   errors naming the current and attempted states.
//!
//! - **Document** (`document.rs`): the named, slugged policy grouping all
//!   versions across locales. Its `status` and `active_version_id` are
//!   caches over the version set, recomputed inside the same commit as any
//!   version-state change — never independently mutated.
//!
//! ## Design
//!
//! The lifecycle uses an enum with a validated transition table rather than
//! typestate types. The version set of a document is heterogeneous (stored,
//! listed, and serialized together across states), so state-per-type would
//! force dynamic erasure everywhere it matters; the enum approach with
//! `transition()` returning `Result` keeps the table in one place and the
//! records serializable.

pub mod document;
pub mod version;

// ─── Version re-exports ─────────────────────────────────────────────

pub use version::{
    TransitionEvidence, Version, VersionFields, VersionStatus, VersionTransitionRecord,
    VersionUpdate,
};

// ─── Document re-exports ────────────────────────────────────────────

pub use document::{Document, DocumentStatus};
