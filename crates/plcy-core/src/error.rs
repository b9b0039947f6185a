//! # Error Hierarchy
//!
//! Structured error types shared across the policy lifecycle engine, built
//! with `thiserror`. Each variant carries enough context to act on: the
//! rejected input and the expected format for validation failures, the
//! current and attempted states for lifecycle violations.
//!
//! Error messages are surfaced verbatim to the admin console, so they must
//! be safe (no internal detail) and actionable.

use thiserror::Error;

/// Validation errors for domain primitives and request payloads.
///
/// Always recoverable by the caller; never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Slug is not URL-safe (lowercase alphanumerics and single hyphens,
    /// no leading or trailing hyphen, at most 64 characters).
    #[error("invalid slug: {0:?} (expected lowercase letters, digits, and single hyphens)")]
    InvalidSlug(String),

    /// Locale is not a recognized language tag.
    #[error("invalid locale: {0:?} (expected a tag such as \"en\" or \"en-GB\")")]
    InvalidLocale(String),

    /// Category name does not match any known policy category.
    #[error("unknown policy category: {0:?}")]
    UnknownCategory(String),

    /// Version content must be non-empty.
    #[error("version content must not be empty")]
    EmptyContent,

    /// Document title must be non-empty.
    #[error("document title must not be empty")]
    EmptyTitle,

    /// Actor identifier must be non-empty.
    #[error("actor id must not be empty")]
    EmptyActor,

    /// Role name must be non-empty.
    #[error("role name must not be empty")]
    EmptyRole,

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: {value:?} ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Lifecycle violations: either the requested edge does not exist in the
/// version state machine, or the operation is not permitted in the record's
/// current state.
///
/// Both variants render the current and attempted states verbatim so the
/// admin console can display them without reconstruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested transition edge is not in the state machine.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// The current lifecycle state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    /// The operation exists but is not permitted in the current state.
    #[error("cannot {operation} while in state {current}")]
    InvalidState {
        /// The current lifecycle state.
        current: String,
        /// The operation that was attempted.
        operation: String,
    },
}
