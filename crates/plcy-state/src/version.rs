//! # Version Lifecycle State Machine
//!
//! Models one localized revision of a policy document through its lifecycle.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ InReview ──▶ Approved ──▶ Published ──▶ Archived
//!   │           │            │                          ▲
//!   └───────────┴────────────┴──────────────────────────┘
//!            (archive is legal from any non-archived state)
//! ```
//!
//! No other transitions are legal. In particular a version never moves
//! backward (a rejected review is archived and replaced, not demoted), and
//! archived is terminal.
//!
//! Publishing stamps `published_at` and defaults `effective_at` to the
//! publication instant when the editor left it unset. Published content is
//! immutable — corrections require a new version.

use serde::{Deserialize, Serialize};

use plcy_core::{
    ActorId, DocumentId, Locale, Timestamp, TransitionError, ValidationError, VersionId,
};

// ─── Version Status ──────────────────────────────────────────────────

/// The lifecycle state of a policy version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    /// Being drafted; freely editable.
    Draft,
    /// Submitted for legal review; still editable.
    InReview,
    /// Review passed; editable until published.
    Approved,
    /// Published; content is immutable. May additionally carry the
    /// per-locale active marker on the owning [`Version`].
    Published,
    /// Retired (terminal). Never shown to end users, number never reused.
    Archived,
}

impl VersionStatus {
    /// The legal target states from this state.
    pub fn valid_transitions(&self) -> &'static [VersionStatus] {
        match self {
            Self::Draft => &[Self::InReview, Self::Archived],
            Self::InReview => &[Self::Approved, Self::Archived],
            Self::Approved => &[Self::Published, Self::Archived],
            Self::Published => &[Self::Archived],
            Self::Archived => &[],
        }
    }

    /// Whether the edge from `self` to `to` exists in the state machine.
    pub fn can_transition(&self, to: VersionStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Whether version fields may still be edited in this state.
    ///
    /// Published content is immutable; archived versions are frozen.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::InReview | Self::Approved)
    }

    /// The canonical state name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::Published => "PUBLISHED",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Parse a state from its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DRAFT" => Some(Self::Draft),
            "IN_REVIEW" => Some(Self::InReview),
            "APPROVED" => Some(Self::Approved),
            "PUBLISHED" => Some(Self::Published),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transition Evidence ─────────────────────────────────────────────

/// Who performed a lifecycle transition, and why.
#[derive(Debug, Clone)]
pub struct TransitionEvidence {
    /// The administrator who initiated the transition.
    pub actor: ActorId,
    /// Reason for the transition.
    pub reason: String,
}

impl TransitionEvidence {
    /// Construct evidence from an actor and a reason.
    pub fn new(actor: ActorId, reason: impl Into<String>) -> Self {
        Self {
            actor,
            reason: reason.into(),
        }
    }
}

/// Record of a version state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionTransitionRecord {
    /// State before the transition.
    pub from: VersionStatus,
    /// State after the transition.
    pub to: VersionStatus,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// The administrator who initiated the transition.
    pub actor: ActorId,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Field Bundles ───────────────────────────────────────────────────

/// The editor-supplied fields of a new version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionFields {
    /// Short human-readable summary of this revision.
    pub summary: String,
    /// What changed relative to the previous version.
    pub change_summary: String,
    /// The policy text itself.
    pub content: String,
    /// Optional link to an externally hosted rendition (PDF etc.).
    pub external_url: Option<String>,
    /// When the version takes legal effect. Defaults to the publication
    /// instant if still unset at publish time.
    pub effective_at: Option<Timestamp>,
}

/// A partial update to an editable version. `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionUpdate {
    /// New summary, if changing.
    pub summary: Option<String>,
    /// New change summary, if changing.
    pub change_summary: Option<String>,
    /// New content, if changing. Must be non-empty.
    pub content: Option<String>,
    /// New external URL; `Some(None)` clears it.
    pub external_url: Option<Option<String>>,
    /// New effective date; `Some(None)` clears it.
    pub effective_at: Option<Option<Timestamp>>,
}

// ─── Version ─────────────────────────────────────────────────────────

/// One localized revision of a policy document.
///
/// Exclusively owned by its [`Document`](crate::Document): versions are
/// deleted only when the owning document is deleted. The `number` is
/// assigned by the store, strictly increasing per `(document, locale)`,
/// starting at 1 and never reused even after archival.
///
/// The `active` marker means "this is the revision end users currently
/// see for this locale". At most one version per `(document, locale)` may
/// carry it; the activation coordinator owns that invariant, not this
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Unique version identifier.
    pub id: VersionId,
    /// The owning document.
    pub document_id: DocumentId,
    /// The locale this revision is written in.
    pub locale: Locale,
    /// Monotonically increasing number per `(document, locale)`.
    pub number: u32,
    /// Current lifecycle state.
    pub status: VersionStatus,
    /// Short human-readable summary of this revision.
    pub summary: String,
    /// What changed relative to the previous version.
    pub change_summary: String,
    /// The policy text itself.
    pub content: String,
    /// Optional link to an externally hosted rendition.
    pub external_url: Option<String>,
    /// When the version takes legal effect.
    pub effective_at: Option<Timestamp>,
    /// Stamped on transition to [`VersionStatus::Published`].
    pub published_at: Option<Timestamp>,
    /// Per-locale active marker. See the type-level docs.
    pub active: bool,
    /// When the version was created.
    pub created_at: Timestamp,
    /// When the version was last modified.
    pub updated_at: Timestamp,
    /// Ordered log of all state transitions.
    pub transitions: Vec<VersionTransitionRecord>,
}

impl Version {
    /// Create a new draft version.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyContent`] if the content is empty
    /// or whitespace-only.
    pub fn new(
        document_id: DocumentId,
        locale: Locale,
        number: u32,
        fields: VersionFields,
    ) -> Result<Self, ValidationError> {
        if fields.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        let now = Timestamp::now();
        Ok(Self {
            id: VersionId::new(),
            document_id,
            locale,
            number,
            status: VersionStatus::Draft,
            summary: fields.summary,
            change_summary: fields.change_summary,
            content: fields.content,
            external_url: fields.external_url,
            effective_at: fields.effective_at,
            published_at: None,
            active: false,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Apply a partial update to the editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidState`] if the version is
    /// published or archived, and [`ValidationError::EmptyContent`]
    /// (wrapped) is enforced by the caller before reaching here — this
    /// method trusts its input content to be non-empty.
    pub fn apply_update(&mut self, update: VersionUpdate) -> Result<(), TransitionError> {
        if !self.status.is_editable() {
            return Err(TransitionError::InvalidState {
                current: self.status.to_string(),
                operation: "update version fields".to_string(),
            });
        }
        if let Some(summary) = update.summary {
            self.summary = summary;
        }
        if let Some(change_summary) = update.change_summary {
            self.change_summary = change_summary;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(external_url) = update.external_url {
            self.external_url = external_url;
        }
        if let Some(effective_at) = update.effective_at {
            self.effective_at = effective_at;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transition to `target`, validating the edge against the table.
    ///
    /// Transitioning to [`VersionStatus::Published`] stamps `published_at`
    /// and defaults `effective_at` to the same instant when unset.
    /// Transitioning to [`VersionStatus::Archived`] clears the active
    /// marker (the activation coordinator handles the document-level
    /// consequences in the same commit).
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::IllegalTransition`] if the edge does not
    /// exist in the state machine.
    pub fn transition(
        &mut self,
        target: VersionStatus,
        evidence: TransitionEvidence,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition(target) {
            return Err(TransitionError::IllegalTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        let now = Timestamp::now();
        match target {
            VersionStatus::Published => {
                if self.effective_at.is_none() {
                    self.effective_at = Some(now);
                }
                self.published_at = Some(now);
            }
            VersionStatus::Archived => {
                self.active = false;
            }
            _ => {}
        }
        self.do_transition(target, now, evidence);
        Ok(())
    }

    /// Archive the version. Legal from any non-archived state.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::IllegalTransition`] if already archived.
    pub fn archive(&mut self, evidence: TransitionEvidence) -> Result<(), TransitionError> {
        self.transition(VersionStatus::Archived, evidence)
    }

    /// Set the per-locale active marker. Caller must have verified the
    /// version is published; this record does not re-check.
    pub fn mark_active(&mut self) {
        self.active = true;
        self.updated_at = Timestamp::now();
    }

    /// Clear the per-locale active marker, leaving the version published
    /// but inactive (reactivatable without number churn).
    pub fn clear_active(&mut self) {
        self.active = false;
        self.updated_at = Timestamp::now();
    }

    /// Whether the version is archived (terminal).
    pub fn is_archived(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a state transition.
    fn do_transition(&mut self, to: VersionStatus, at: Timestamp, evidence: TransitionEvidence) {
        self.transitions.push(VersionTransitionRecord {
            from: self.status,
            to,
            timestamp: at,
            actor: evidence.actor,
            reason: evidence.reason,
        });
        self.status = to;
        self.updated_at = at;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(reason: &str) -> TransitionEvidence {
        TransitionEvidence::new(ActorId::new("test-admin").unwrap(), reason)
    }

    fn fields(content: &str) -> VersionFields {
        VersionFields {
            summary: "Initial terms".to_string(),
            change_summary: "First revision".to_string(),
            content: content.to_string(),
            external_url: None,
            effective_at: None,
        }
    }

    fn make_draft() -> Version {
        Version::new(
            DocumentId::new(),
            Locale::new("en").unwrap(),
            1,
            fields("These are the terms."),
        )
        .unwrap()
    }

    fn make_published() -> Version {
        let mut v = make_draft();
        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        v.transition(VersionStatus::Approved, evidence("review passed")).unwrap();
        v.transition(VersionStatus::Published, evidence("published")).unwrap();
        v
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_version_is_draft_and_inactive() {
        let v = make_draft();
        assert_eq!(v.status, VersionStatus::Draft);
        assert!(!v.active);
        assert_eq!(v.number, 1);
        assert!(v.published_at.is_none());
    }

    #[test]
    fn new_version_rejects_empty_content() {
        let result = Version::new(
            DocumentId::new(),
            Locale::new("en").unwrap(),
            1,
            fields("   "),
        );
        assert!(matches!(result, Err(ValidationError::EmptyContent)));
    }

    // ── Happy-path lifecycle ─────────────────────────────────────────

    #[test]
    fn draft_to_published_walk() {
        let v = make_published();
        assert_eq!(v.status, VersionStatus::Published);
        assert!(v.published_at.is_some());
        assert!(v.effective_at.is_some());
        assert_eq!(v.transitions.len(), 3);
    }

    #[test]
    fn publish_preserves_explicit_effective_at() {
        let mut v = make_draft();
        let when = Timestamp::parse("2026-03-01T00:00:00Z").unwrap();
        v.effective_at = Some(when);
        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        v.transition(VersionStatus::Approved, evidence("approved")).unwrap();
        v.transition(VersionStatus::Published, evidence("published")).unwrap();
        assert_eq!(v.effective_at, Some(when));
    }

    // ── Invalid transitions ──────────────────────────────────────────

    #[test]
    fn draft_cannot_publish_directly() {
        let mut v = make_draft();
        let result = v.transition(VersionStatus::Published, evidence("skip review"));
        assert!(matches!(
            result,
            Err(TransitionError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn no_backward_transitions() {
        let mut v = make_draft();
        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        assert!(v.transition(VersionStatus::Draft, evidence("back")).is_err());
    }

    #[test]
    fn archived_is_terminal() {
        let mut v = make_draft();
        v.archive(evidence("abandoned")).unwrap();
        for target in [
            VersionStatus::Draft,
            VersionStatus::InReview,
            VersionStatus::Approved,
            VersionStatus::Published,
            VersionStatus::Archived,
        ] {
            assert!(v.transition(target, evidence("resurrect")).is_err());
        }
    }

    #[test]
    fn publish_archived_fails() {
        let mut v = make_draft();
        v.archive(evidence("abandoned")).unwrap();
        let err = v
            .transition(VersionStatus::Published, evidence("too late"))
            .unwrap_err();
        match err {
            TransitionError::IllegalTransition { from, to } => {
                assert_eq!(from, "ARCHIVED");
                assert_eq!(to, "PUBLISHED");
            }
            other => panic!("expected IllegalTransition, got: {other:?}"),
        }
    }

    // ── Archive from every non-archived state ────────────────────────

    #[test]
    fn archive_legal_from_all_non_archived_states() {
        // Draft
        let mut v = make_draft();
        assert!(v.archive(evidence("drop")).is_ok());

        // InReview
        let mut v = make_draft();
        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        assert!(v.archive(evidence("drop")).is_ok());

        // Approved
        let mut v = make_draft();
        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        v.transition(VersionStatus::Approved, evidence("approved")).unwrap();
        assert!(v.archive(evidence("drop")).is_ok());

        // Published
        let mut v = make_published();
        assert!(v.archive(evidence("superseded")).is_ok());
    }

    #[test]
    fn archiving_active_version_clears_marker() {
        let mut v = make_published();
        v.mark_active();
        assert!(v.active);
        v.archive(evidence("retired")).unwrap();
        assert!(!v.active);
        assert_eq!(v.status, VersionStatus::Archived);
    }

    // ── Editability ──────────────────────────────────────────────────

    #[test]
    fn update_allowed_while_editable() {
        let mut v = make_draft();
        v.apply_update(VersionUpdate {
            content: Some("Revised terms.".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(v.content, "Revised terms.");

        v.transition(VersionStatus::InReview, evidence("submitted")).unwrap();
        assert!(v.apply_update(VersionUpdate::default()).is_ok());

        v.transition(VersionStatus::Approved, evidence("approved")).unwrap();
        assert!(v.apply_update(VersionUpdate::default()).is_ok());
    }

    #[test]
    fn update_rejected_once_published() {
        let mut v = make_published();
        let err = v
            .apply_update(VersionUpdate {
                content: Some("sneaky edit".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { .. }));
        assert_eq!(v.content, "These are the terms.");
    }

    #[test]
    fn update_rejected_once_archived() {
        let mut v = make_draft();
        v.archive(evidence("dropped")).unwrap();
        assert!(v.apply_update(VersionUpdate::default()).is_err());
    }

    #[test]
    fn update_clears_optional_fields() {
        let mut v = make_draft();
        v.external_url = Some("https://cdn.example.com/terms.pdf".to_string());
        v.apply_update(VersionUpdate {
            external_url: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert!(v.external_url.is_none());
    }

    // ── Transition log ───────────────────────────────────────────────

    #[test]
    fn transition_log_records_all_changes() {
        let v = make_published();
        assert_eq!(v.transitions[0].from, VersionStatus::Draft);
        assert_eq!(v.transitions[0].to, VersionStatus::InReview);
        assert_eq!(v.transitions[1].to, VersionStatus::Approved);
        assert_eq!(v.transitions[2].to, VersionStatus::Published);
        assert_eq!(v.transitions[2].actor.as_str(), "test-admin");
    }

    // ── Status helpers ───────────────────────────────────────────────

    #[test]
    fn status_name_roundtrip() {
        for status in [
            VersionStatus::Draft,
            VersionStatus::InReview,
            VersionStatus::Approved,
            VersionStatus::Published,
            VersionStatus::Archived,
        ] {
            assert_eq!(VersionStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(VersionStatus::from_name("LIVE"), None);
    }

    #[test]
    fn status_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&VersionStatus::InReview).unwrap();
        assert_eq!(json, "\"IN_REVIEW\"");
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn version_serialization_roundtrip() {
        let v = make_published();
        let json = serde_json::to_string(&v).unwrap();
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, v.id);
        assert_eq!(parsed.status, v.status);
        assert_eq!(parsed.transitions.len(), v.transitions.len());
    }
}
