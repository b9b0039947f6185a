#![deny(missing_docs)]

//! # plcy-core — Foundational Types for the Policy Lifecycle Engine
//!
//! This crate defines the foundational types that every other crate in the
//! workspace depends on. It has no internal crate dependencies — only `serde`,
//! `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`DocumentId`] where a [`VersionId`]
//!    is expected, and a [`Slug`] or [`Locale`] that exists at all is one
//!    that passed validation.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!    Local offsets are rejected on the strict parse path so that rendered
//!    timestamps are deterministic across the audit trail.
//!
//! 3. **Structured errors with `thiserror`.** [`ValidationError`] carries the
//!    rejected input and the expected format; [`TransitionError`] carries the
//!    current and attempted lifecycle states verbatim. No `Box<dyn Error>`,
//!    no `.unwrap()` outside tests.

pub mod category;
pub mod error;
pub mod identity;
pub mod locale;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use category::PolicyCategory;
pub use error::{TransitionError, ValidationError};
pub use identity::{ActorId, AuditEventId, DocumentId, Role, Slug, VersionId};
pub use locale::Locale;
pub use temporal::Timestamp;
