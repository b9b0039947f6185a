//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the policy engine.
//! Each identifier is a distinct type — you cannot pass a [`DocumentId`]
//! where a [`VersionId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`Slug`], [`ActorId`], [`Role`]) validate
//! format at construction time. UUID-based identifiers ([`DocumentId`],
//! [`VersionId`], [`AuditEventId`]) are always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a policy document (e.g., the Terms of Service,
/// spanning all of its locales and versions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random document identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a document identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for one localized version of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(Uuid);

impl VersionId {
    /// Create a new random version identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a version identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for an audit trail event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEventId(Uuid);

impl AuditEventId {
    /// Create a new random audit event identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an audit event identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// URL-safe document slug.
///
/// The slug is the stable, human-readable handle the consumer-facing site
/// and the admin console use to address a document (`/legal/terms`).
///
/// # Validation
///
/// - 1 to 64 characters
/// - Lowercase ASCII letters, digits, and hyphens only
/// - No leading, trailing, or doubled hyphens
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    /// Create a slug from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSlug`] if the string is empty,
    /// longer than 64 characters, contains anything other than lowercase
    /// alphanumerics and hyphens, or has a hyphen at either end or doubled.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() || s.len() > 64 {
            return Err(ValidationError::InvalidSlug(s.to_string()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidSlug(s.to_string()));
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(ValidationError::InvalidSlug(s.to_string()));
        }
        Ok(())
    }

    /// Access the slug string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated administrator on whose behalf a mutation runs.
///
/// The engine does not interpret the value beyond non-emptiness; the auth
/// layer upstream owns its meaning (user id, service account, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Create an actor identifier from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyActor`] if the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyActor);
        }
        Ok(Self(s))
    }

    /// Access the actor identifier string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A marketplace role name used in a document's audience and editor sets
/// (e.g., `"worker"`, `"employer"`, `"admin"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role(String);

impl Role {
    /// Create a role from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRole`] if the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyRole);
        }
        Ok(Self(s))
    }

    /// Access the role name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
