//! Audit event records and chain verification.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use plcy_core::{ActorId, AuditEventId, DocumentId, Timestamp, VersionId};

/// The hash a chain starts from, before any event exists.
pub(crate) const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// The closed set of auditable actions, rendered as dotted action strings
/// (`document.created`, `version.published`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A document was created.
    #[serde(rename = "document.created")]
    DocumentCreated,
    /// Document fields were edited.
    #[serde(rename = "document.updated")]
    DocumentUpdated,
    /// A document (and, by cascade, its versions) was deleted.
    #[serde(rename = "document.deleted")]
    DocumentDeleted,
    /// A version was created.
    #[serde(rename = "version.created")]
    VersionCreated,
    /// Version fields were edited.
    #[serde(rename = "version.updated")]
    VersionUpdated,
    /// A version moved to a new lifecycle state short of publication
    /// (review submission, approval).
    #[serde(rename = "version.transitioned")]
    VersionTransitioned,
    /// A version was published.
    #[serde(rename = "version.published")]
    VersionPublished,
    /// A version became the active one for its locale.
    #[serde(rename = "version.activated")]
    VersionActivated,
    /// A version was archived.
    #[serde(rename = "version.archived")]
    VersionArchived,
}

impl AuditAction {
    /// The dotted action string, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentCreated => "document.created",
            Self::DocumentUpdated => "document.updated",
            Self::DocumentDeleted => "document.deleted",
            Self::VersionCreated => "version.created",
            Self::VersionUpdated => "version.updated",
            Self::VersionTransitioned => "version.transitioned",
            Self::VersionPublished => "version.published",
            Self::VersionActivated => "version.activated",
            Self::VersionArchived => "version.archived",
        }
    }

    /// Parse an action from its dotted string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "document.created" => Some(Self::DocumentCreated),
            "document.updated" => Some(Self::DocumentUpdated),
            "document.deleted" => Some(Self::DocumentDeleted),
            "version.created" => Some(Self::VersionCreated),
            "version.updated" => Some(Self::VersionUpdated),
            "version.transitioned" => Some(Self::VersionTransitioned),
            "version.published" => Some(Self::VersionPublished),
            "version.activated" => Some(Self::VersionActivated),
            "version.archived" => Some(Self::VersionArchived),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit event to be appended — everything except what the log itself
/// assigns (id, chain hashes, timestamp).
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    /// The document the action concerns.
    pub document_id: DocumentId,
    /// The version the action concerns, for version-level actions.
    pub version_id: Option<VersionId>,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub actor: ActorId,
    /// Free-form context sufficient to reconstruct the change
    /// (field-level diffs, state names, locale).
    pub metadata: serde_json::Value,
}

/// An immutable, appended audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: AuditEventId,
    /// The document the action concerns.
    pub document_id: DocumentId,
    /// The version the action concerns, for version-level actions.
    pub version_id: Option<VersionId>,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub actor: ActorId,
    /// Free-form context sufficient to reconstruct the change.
    pub metadata: serde_json::Value,
    /// Hash of the previous event in the log; `None` for the first event.
    pub previous_hash: Option<String>,
    /// SHA-256 over the previous hash and this event's identifying fields.
    pub event_hash: String,
    /// When the event was appended.
    pub created_at: Timestamp,
}

impl AuditEvent {
    /// Compute the chain hash for an event's identifying fields.
    pub(crate) fn chain_hash(previous: &str, event: &NewAuditEvent, id: &AuditEventId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(previous.as_bytes());
        hasher.update(id.as_uuid().as_bytes());
        hasher.update(event.action.as_str().as_bytes());
        hasher.update(event.document_id.as_uuid().as_bytes());
        if let Some(version_id) = &event.version_id {
            hasher.update(version_id.as_uuid().as_bytes());
        }
        hasher.update(event.actor.as_str().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Result of a chain integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainIntegrity {
    /// Number of events inspected.
    pub total_events: usize,
    /// Number of events whose `previous_hash` did not match the
    /// predecessor's `event_hash`.
    pub broken_links: usize,
    /// Whether the chain is intact.
    pub chain_valid: bool,
}

/// Verify hash continuity over a slice of events in append order.
pub fn verify_chain(events: &[AuditEvent]) -> ChainIntegrity {
    let mut broken_links = 0;
    let mut last_hash: Option<&str> = None;

    for event in events {
        let expected_prev = last_hash.unwrap_or(GENESIS_HASH);
        let actual_prev = event.previous_hash.as_deref().unwrap_or(GENESIS_HASH);
        if actual_prev != expected_prev {
            broken_links += 1;
        }
        last_hash = Some(&event.event_hash);
    }

    ChainIntegrity {
        total_events: events.len(),
        broken_links,
        chain_valid: broken_links == 0,
    }
}
