//! # plcy-audit — Append-Only Audit Trail
//!
//! Every state mutation in the policy engine (document creation, version
//! publication, activation, ...) appends an [`AuditEvent`] with a SHA-256
//! hash chaining to the previous event, forming a tamper-evident log.
//!
//! ## Best-effort, monitored
//!
//! Audit is observability, not a transactional participant. The
//! [`AuditRecorder`] never fails the enclosing operation: a failed append
//! is retried once, and if it fails again the event is parked on a
//! reconciliation queue and the failure is logged for operators. A
//! committed mutation is never rolled back or reported as failed because
//! its audit write did not land — but the loss is always surfaced.
//!
//! ## Read path
//!
//! [`AuditSink::events_for`] returns events newest-first with opaque
//! cursor pagination, which is how the admin console renders a document's
//! history.

pub mod event;
pub mod log;
pub mod recorder;

pub use event::{verify_chain, AuditAction, AuditEvent, ChainIntegrity, NewAuditEvent};
pub use log::{AuditError, AuditPage, AuditSink, InMemoryAuditLog};
pub use recorder::AuditRecorder;
