//! # plcy-store — Persistence Seam
//!
//! The storage boundary of the policy engine. The [`PolicyStore`] trait is
//! what a real storage engine (Postgres, say) would implement; the service
//! layer is written against it and ships with [`InMemoryPolicyStore`].
//!
//! ## Atomicity model
//!
//! Every mutating service operation ends in exactly one [`Commit`]: a write
//! set of record upserts plus an optional activation-token compare-and-swap.
//! A commit applies all-or-nothing — validation happens before the commit
//! is built, and a failed token check rejects the whole write set. This is
//! what keeps "archive the old active version" and "activate the new one"
//! a single transaction.
//!
//! A document's derived fields (`status`, `active_version_id`) are
//! recomputed by the store itself from the version set it just committed,
//! under the write lock, so they can never regress to a stale caller
//! snapshot.
//!
//! ## Tokens and counters
//!
//! The store owns three bits of bookkeeping the records themselves must not:
//!
//! - **Version counters** per `(document, locale)`: strictly increasing,
//!   starting at 1, never reused even after archival.
//! - **Activation tokens** per `(document, locale)`: a revision counter
//!   bumped on every committed activation change. Callers that prepared a
//!   write against a stale token lose with [`StoreError::TokenConflict`]
//!   instead of silently double-activating.
//! - **Document revisions** per document: bumped on every commit touching
//!   the document or its versions. Mutations guard their commits with
//!   [`Commit::expect_revision`] so that concurrent writers for the same
//!   document are serialized, the loser surfacing
//!   [`StoreError::RevisionConflict`] instead of overwriting the winner.

pub mod memory;
pub mod store;

pub use memory::InMemoryPolicyStore;
pub use store::{Commit, PolicyStore, RevisionSwap, StoreError, TokenSwap};
