//! # Policy Service
//!
//! The single entry point for document and version operations. Every
//! mutating call is one logical transaction: read the document revision,
//! validate the input against records loaded after that read, apply the
//! state change, commit the write set atomically under a revision guard,
//! then record exactly one audit event and invalidate the read cache.
//! Concurrent writers for the same document are serialized by the guard;
//! the loser surfaces [`PolicyError::Conflict`] instead of overwriting the
//! winner. Derived document fields are recomputed by the store at commit
//! time. Audit recording is best-effort and never fails the committed
//! mutation.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;

use plcy_audit::{
    AuditAction, AuditPage, AuditRecorder, AuditSink, InMemoryAuditLog, NewAuditEvent,
};
use plcy_core::{
    ActorId, AuditEventId, DocumentId, Locale, PolicyCategory, Role, Slug, Timestamp,
    ValidationError, VersionId,
};
use plcy_state::{
    Document, TransitionEvidence, Version, VersionStatus, VersionUpdate,
};
use plcy_store::{Commit, InMemoryPolicyStore, PolicyStore};

use crate::activation::{ActivationCoordinator, ActivationOutcome};
use crate::aggregate::DocumentAggregate;
use crate::cache::ReadCache;
use crate::error::PolicyError;
use crate::requests::{
    CreateDocumentRequest, CreateVersionRequest, DocumentPatch, GetDocumentOptions,
};

/// Page size for audit history fetched through document reads.
const AUDIT_PAGE_LIMIT: usize = 50;

/// The policy engine facade. Cheap to clone; all clones share state.
pub struct PolicyService<S: PolicyStore> {
    store: Arc<S>,
    coordinator: ActivationCoordinator<S>,
    recorder: AuditRecorder,
    cache: ReadCache,
}

impl<S: PolicyStore> Clone for PolicyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            coordinator: self.coordinator.clone(),
            recorder: self.recorder.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl PolicyService<InMemoryPolicyStore> {
    /// A fully in-memory engine, for tests and local tooling.
    pub fn in_memory() -> Self {
        Self::new(InMemoryPolicyStore::new(), Arc::new(InMemoryAuditLog::new()))
    }
}

impl<S: PolicyStore> PolicyService<S> {
    /// Create a service over a store and an audit sink.
    pub fn new(store: S, sink: Arc<dyn AuditSink>) -> Self {
        let store = Arc::new(store);
        Self {
            coordinator: ActivationCoordinator::new(Arc::clone(&store)),
            store,
            recorder: AuditRecorder::new(sink),
            cache: ReadCache::new(),
        }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The audit recorder, exposing the reconciliation queue.
    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    // ─── Document Operations ─────────────────────────────────────────

    /// Create a document with no versions.
    ///
    /// # Errors
    ///
    /// Validation errors for a malformed slug, locale, category, or role,
    /// or an empty title; [`PolicyError::Conflict`] when the slug is
    /// already in use.
    pub fn create_document(
        &self,
        request: CreateDocumentRequest,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let slug = Slug::new(request.slug)?;
        if request.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        let category = PolicyCategory::from_name(&request.category)?;
        let default_locale = Locale::new(&request.default_locale)?;

        let mut document = Document::new(slug, request.title, category, default_locale);
        document.region = request.region;
        document.summary = request.summary;
        document.audience_roles = parse_roles(request.audience_roles)?;
        document.editor_roles = parse_roles(request.editor_roles)?;
        document.tags = request.tags.into_iter().collect();
        document.metadata = request.metadata;

        self.store.insert_document(document.clone())?;
        tracing::info!(
            document_id = %document.id,
            slug = %document.slug,
            category = category.as_str(),
            "document created"
        );
        self.record(NewAuditEvent {
            document_id: document.id,
            version_id: None,
            action: AuditAction::DocumentCreated,
            actor: actor.clone(),
            metadata: json!({
                "slug": document.slug.as_str(),
                "title": document.title,
                "category": category.as_str(),
            }),
        });

        Ok(DocumentAggregate {
            document,
            versions: Some(Vec::new()),
            audit: None,
            from_cache: false,
        })
    }

    /// Apply a partial update to a document's own fields.
    ///
    /// An empty patch is a no-op success and produces no audit event.
    /// Changing the default locale re-derives `active_version_id`.
    pub fn update_document(
        &self,
        document_id: DocumentId,
        patch: DocumentPatch,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let revision = self.store.document_revision(document_id)?;
        let mut document = self.require_document(document_id)?;
        let old_slug = document.slug.clone();
        let mut changed: Vec<&'static str> = Vec::new();

        if let Some(slug) = patch.slug {
            let slug = Slug::new(slug)?;
            if slug != document.slug {
                document.slug = slug;
                changed.push("slug");
            }
        }
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle.into());
            }
            document.title = title;
            changed.push("title");
        }
        if let Some(category) = patch.category {
            document.category = PolicyCategory::from_name(&category)?;
            changed.push("category");
        }
        if let Some(locale) = patch.default_locale {
            document.default_locale = Locale::new(&locale)?;
            changed.push("default_locale");
        }
        if let Some(summary) = patch.summary {
            document.summary = summary;
            changed.push("summary");
        }
        if let Some(region) = patch.region {
            document.region = region;
            changed.push("region");
        }
        if let Some(roles) = patch.audience_roles {
            document.audience_roles = parse_roles(roles)?;
            changed.push("audience_roles");
        }
        if let Some(roles) = patch.editor_roles {
            document.editor_roles = parse_roles(roles)?;
            changed.push("editor_roles");
        }
        if let Some(tags) = patch.tags {
            document.tags = tags.into_iter().collect();
            changed.push("tags");
        }
        if let Some(metadata) = patch.metadata {
            document.metadata = metadata;
            changed.push("metadata");
        }

        if changed.is_empty() {
            let versions = self.store.versions_for(document_id)?;
            return Ok(aggregate(document, versions));
        }

        document.touch();
        self.store.commit(
            Commit::new()
                .with_document(document.clone())
                .expect_revision(document_id, revision),
        )?;

        tracing::info!(
            document_id = %document.id,
            fields = ?changed,
            "document updated"
        );
        self.record(NewAuditEvent {
            document_id: document.id,
            version_id: None,
            action: AuditAction::DocumentUpdated,
            actor: actor.clone(),
            metadata: json!({ "changed": changed }),
        });
        self.cache.invalidate(&old_slug);
        self.cache.invalidate(&document.slug);

        self.reload_aggregate(document_id)
    }

    /// Delete a document and, by cascade, every version it owns.
    ///
    /// This is the only deletion path for versions.
    pub fn delete_document(
        &self,
        document_id: DocumentId,
        actor: &ActorId,
    ) -> Result<(), PolicyError> {
        let versions_deleted = self.store.versions_for(document_id)?.len();
        let removed = self
            .store
            .remove_document(document_id)?
            .ok_or_else(|| PolicyError::NotFound(format!("document {document_id}")))?;

        tracing::info!(
            document_id = %document_id,
            slug = %removed.slug,
            versions_deleted,
            "document deleted"
        );
        self.record(NewAuditEvent {
            document_id,
            version_id: None,
            action: AuditAction::DocumentDeleted,
            actor: actor.clone(),
            metadata: json!({
                "slug": removed.slug.as_str(),
                "versions_deleted": versions_deleted,
            }),
        });
        self.cache.invalidate(&removed.slug);
        Ok(())
    }

    // ─── Version Operations ──────────────────────────────────────────

    /// Create a draft version under a document.
    ///
    /// The version number is allocated by the store per
    /// `(document, locale)`: strictly increasing from 1, never reused.
    pub fn create_version(
        &self,
        document_id: DocumentId,
        request: CreateVersionRequest,
        actor: &ActorId,
    ) -> Result<(VersionId, DocumentAggregate), PolicyError> {
        let document = self.require_document(document_id)?;
        let locale = Locale::new(&request.locale)?;
        if request.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let number = self.store.next_version_number(document_id, &locale)?;
        let version = Version::new(document_id, locale.clone(), number, request.into_fields())?;

        // A brand-new record cannot clobber anything, so no revision guard.
        self.store
            .commit(Commit::new().with_version(version.clone()))?;

        tracing::info!(
            document_id = %document_id,
            version_id = %version.id,
            locale = %locale,
            number,
            "version created"
        );
        self.record(NewAuditEvent {
            document_id,
            version_id: Some(version.id),
            action: AuditAction::VersionCreated,
            actor: actor.clone(),
            metadata: json!({ "locale": locale.as_str(), "number": number }),
        });
        self.cache.invalidate(&document.slug);

        Ok((version.id, self.reload_aggregate(document_id)?))
    }

    /// Apply a partial update to an editable version's fields.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyContent`] (wrapped) when the patch sets
    /// empty content; invalid-state when the version is published or
    /// archived.
    pub fn update_version(
        &self,
        version_id: VersionId,
        update: VersionUpdate,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        if let Some(content) = &update.content {
            if content.trim().is_empty() {
                return Err(ValidationError::EmptyContent.into());
            }
        }
        let (revision, mut version, document) = self.guarded_snapshot(version_id)?;

        let changed = changed_version_fields(&update);
        version.apply_update(update)?;
        if changed.is_empty() {
            return self.reload_aggregate(document.id);
        }
        self.store.commit(
            Commit::new()
                .with_version(version.clone())
                .expect_revision(document.id, revision),
        )?;

        tracing::info!(
            document_id = %document.id,
            version_id = %version_id,
            fields = ?changed,
            "version updated"
        );
        self.record(NewAuditEvent {
            document_id: document.id,
            version_id: Some(version_id),
            action: AuditAction::VersionUpdated,
            actor: actor.clone(),
            metadata: json!({ "changed": changed }),
        });
        self.cache.invalidate(&document.slug);

        self.reload_aggregate(document.id)
    }

    /// Move a version along a lifecycle edge.
    ///
    /// This is the strict state-machine surface: the edge must exist in
    /// the transition table, with no idempotent shortcuts. Archival is
    /// routed through the activation coordinator so an active version's
    /// marker is cleared under the token guard.
    pub fn transition_version(
        &self,
        version_id: VersionId,
        target: VersionStatus,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        if target == VersionStatus::Archived {
            return self.archive_version(version_id, actor);
        }

        let (revision, mut version, document) = self.guarded_snapshot(version_id)?;
        let evidence = TransitionEvidence::new(actor.clone(), transition_reason(target));
        let from = version.status;
        version.transition(target, evidence)?;

        self.store.commit(
            Commit::new()
                .with_version(version.clone())
                .expect_revision(document.id, revision),
        )?;

        tracing::info!(
            document_id = %document.id,
            version_id = %version_id,
            from = from.as_str(),
            to = target.as_str(),
            "version transitioned"
        );
        let action = match target {
            VersionStatus::Published => AuditAction::VersionPublished,
            _ => AuditAction::VersionTransitioned,
        };
        self.record(NewAuditEvent {
            document_id: document.id,
            version_id: Some(version_id),
            action,
            actor: actor.clone(),
            metadata: json!({ "from": from.as_str(), "to": target.as_str() }),
        });
        self.cache.invalidate(&document.slug);

        self.reload_aggregate(document.id)
    }

    /// Publish an approved version.
    ///
    /// Publishing an already-published version is a no-op success.
    /// `effective_at` overrides the version's stored effective date; when
    /// neither is set, publication stamps the current instant.
    pub fn publish_version(
        &self,
        version_id: VersionId,
        effective_at: Option<Timestamp>,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let (revision, mut version, document) = self.guarded_snapshot(version_id)?;

        if version.status == VersionStatus::Published {
            tracing::debug!(version_id = %version_id, "publish no-op, already published");
            return self.reload_aggregate(document.id);
        }

        if let Some(at) = effective_at {
            version.effective_at = Some(at);
        }
        let evidence = TransitionEvidence::new(actor.clone(), "published");
        version.transition(VersionStatus::Published, evidence)?;

        self.store.commit(
            Commit::new()
                .with_version(version.clone())
                .expect_revision(document.id, revision),
        )?;

        tracing::info!(
            document_id = %document.id,
            version_id = %version_id,
            locale = %version.locale,
            number = version.number,
            "version published"
        );
        self.record(NewAuditEvent {
            document_id: document.id,
            version_id: Some(version_id),
            action: AuditAction::VersionPublished,
            actor: actor.clone(),
            metadata: json!({
                "locale": version.locale.as_str(),
                "number": version.number,
                "effective_at": version.effective_at.map(|t| t.to_iso8601()),
            }),
        });
        self.cache.invalidate(&document.slug);

        self.reload_aggregate(document.id)
    }

    /// Make a published version the active one for its locale.
    ///
    /// Activating the already-active version is a no-op success. A
    /// concurrent activation change for the same `(document, locale)`
    /// surfaces as [`PolicyError::Conflict`] for the losing caller.
    pub fn activate_version(
        &self,
        version_id: VersionId,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let outcome = self.coordinator.activate(version_id, None)?;
        if outcome.changed {
            tracing::info!(
                document_id = %outcome.document.id,
                version_id = %version_id,
                locale = %outcome.version.locale,
                previous_active = ?outcome.previous_active,
                "version activated"
            );
            self.record(NewAuditEvent {
                document_id: outcome.document.id,
                version_id: Some(version_id),
                action: AuditAction::VersionActivated,
                actor: actor.clone(),
                metadata: json!({
                    "locale": outcome.version.locale.as_str(),
                    "previous_active": outcome.previous_active.map(|id| id.to_string()),
                }),
            });
            self.cache.invalidate(&outcome.document.slug);
        }
        self.outcome_aggregate(outcome)
    }

    /// Make a published version the active one for its locale, archiving
    /// the version it supersedes in the same commit.
    ///
    /// With no previously active version for the locale this behaves like
    /// [`PolicyService::activate_version`]. The single commit means there
    /// is no instant at which the predecessor is archived but the new
    /// version not yet active, or both hold the marker.
    pub fn supersede_version(
        &self,
        version_id: VersionId,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let evidence = TransitionEvidence::new(actor.clone(), "superseded");
        let outcome = self.coordinator.activate(version_id, Some(evidence))?;
        if outcome.changed {
            tracing::info!(
                document_id = %outcome.document.id,
                version_id = %version_id,
                locale = %outcome.version.locale,
                superseded = ?outcome.previous_active,
                "version activated, predecessor archived"
            );
            self.record(NewAuditEvent {
                document_id: outcome.document.id,
                version_id: Some(version_id),
                action: AuditAction::VersionActivated,
                actor: actor.clone(),
                metadata: json!({
                    "locale": outcome.version.locale.as_str(),
                    "previous_active": outcome.previous_active.map(|id| id.to_string()),
                    "superseded": true,
                }),
            });
            self.cache.invalidate(&outcome.document.slug);
        }
        self.outcome_aggregate(outcome)
    }

    /// Archive a version, clearing its active marker when it holds one.
    ///
    /// Archiving an archived version is a no-op success. The locale is
    /// never auto-promoted to another version.
    pub fn archive_version(
        &self,
        version_id: VersionId,
        actor: &ActorId,
    ) -> Result<DocumentAggregate, PolicyError> {
        let evidence = TransitionEvidence::new(actor.clone(), "archived");
        let outcome = self.coordinator.archive(version_id, evidence)?;
        if outcome.changed {
            tracing::info!(
                document_id = %outcome.document.id,
                version_id = %version_id,
                was_active = outcome.was_active,
                "version archived"
            );
            self.record(NewAuditEvent {
                document_id: outcome.document.id,
                version_id: Some(version_id),
                action: AuditAction::VersionArchived,
                actor: actor.clone(),
                metadata: json!({
                    "locale": outcome.version.locale.as_str(),
                    "was_active": outcome.was_active,
                }),
            });
            self.cache.invalidate(&outcome.document.slug);
        }
        self.outcome_aggregate(outcome)
    }

    // ─── Read Operations ─────────────────────────────────────────────

    /// Fetch a document by slug.
    pub fn get_document(
        &self,
        slug: &Slug,
        options: GetDocumentOptions,
    ) -> Result<DocumentAggregate, PolicyError> {
        if options.allow_cached && !options.include_audit {
            if let Some(entry) = self.cache.get(slug) {
                return Ok(DocumentAggregate {
                    document: entry.document.clone(),
                    versions: options.include_versions.then(|| entry.versions.clone()),
                    audit: None,
                    from_cache: true,
                });
            }
        }
        let document = self
            .store
            .document_by_slug(slug)?
            .ok_or_else(|| PolicyError::NotFound(format!("document '{slug}'")))?;
        self.assemble(document, options)
    }

    /// Fetch a document by id.
    pub fn get_document_by_id(
        &self,
        document_id: DocumentId,
        options: GetDocumentOptions,
    ) -> Result<DocumentAggregate, PolicyError> {
        let document = self.require_document(document_id)?;
        if options.allow_cached && !options.include_audit {
            if let Some(entry) = self.cache.get(&document.slug) {
                return Ok(DocumentAggregate {
                    document: entry.document.clone(),
                    versions: options.include_versions.then(|| entry.versions.clone()),
                    audit: None,
                    from_cache: true,
                });
            }
        }
        self.assemble(document, options)
    }

    /// List all documents in creation order.
    pub fn list_documents(
        &self,
        include_versions: bool,
    ) -> Result<Vec<DocumentAggregate>, PolicyError> {
        let documents = self.store.list_documents()?;
        let mut out = Vec::with_capacity(documents.len());
        for document in documents {
            let versions = if include_versions {
                Some(self.store.versions_for(document.id)?)
            } else {
                None
            };
            out.push(DocumentAggregate {
                document,
                versions,
                audit: None,
                from_cache: false,
            });
        }
        Ok(out)
    }

    /// A document's audit history, newest-first, paginated.
    ///
    /// `cursor` is the `next_cursor` of the previous page.
    pub fn list_audit(
        &self,
        document_id: DocumentId,
        limit: usize,
        cursor: Option<AuditEventId>,
    ) -> Result<AuditPage, PolicyError> {
        self.require_document(document_id)?;
        self.recorder
            .sink()
            .events_for(document_id, limit, cursor)
            .map_err(|e| PolicyError::Persistence(e.to_string()))
    }

    // ─── Internals ───────────────────────────────────────────────────

    /// Revision-first snapshot of a version and its document. The revision
    /// is read before the records, so a commit guarded with it can only
    /// land if nothing rewrote the document's state in between.
    fn guarded_snapshot(
        &self,
        version_id: VersionId,
    ) -> Result<(u64, Version, Document), PolicyError> {
        let locator = self.require_version(version_id)?;
        let revision = self.store.document_revision(locator.document_id)?;
        let version = self.require_version(version_id)?;
        let document = self.require_document(version.document_id)?;
        Ok((revision, version, document))
    }

    fn assemble(
        &self,
        document: Document,
        options: GetDocumentOptions,
    ) -> Result<DocumentAggregate, PolicyError> {
        let versions = self.store.versions_for(document.id)?;
        self.cache.put(document.clone(), versions.clone());
        let audit = if options.include_audit {
            let page = self
                .recorder
                .sink()
                .events_for(document.id, AUDIT_PAGE_LIMIT, None)
                .map_err(|e| PolicyError::Persistence(e.to_string()))?;
            Some(page.events)
        } else {
            None
        };
        Ok(DocumentAggregate {
            document,
            versions: options.include_versions.then_some(versions),
            audit,
            from_cache: false,
        })
    }

    /// Post-mutation aggregate re-read from the store, derived fields as
    /// committed.
    fn reload_aggregate(&self, document_id: DocumentId) -> Result<DocumentAggregate, PolicyError> {
        let document = self.require_document(document_id)?;
        let versions = self.store.versions_for(document_id)?;
        Ok(aggregate(document, versions))
    }

    fn outcome_aggregate(
        &self,
        outcome: ActivationOutcome,
    ) -> Result<DocumentAggregate, PolicyError> {
        self.reload_aggregate(outcome.document.id)
    }

    fn require_document(&self, id: DocumentId) -> Result<Document, PolicyError> {
        self.store
            .document(id)?
            .ok_or_else(|| PolicyError::NotFound(format!("document {id}")))
    }

    fn require_version(&self, id: VersionId) -> Result<Version, PolicyError> {
        self.store
            .version(id)?
            .ok_or_else(|| PolicyError::NotFound(format!("version {id}")))
    }

    fn record(&self, event: NewAuditEvent) {
        self.recorder.record(event);
    }
}

fn parse_roles(names: Vec<String>) -> Result<BTreeSet<Role>, ValidationError> {
    names.into_iter().map(Role::new).collect()
}

fn aggregate(document: Document, versions: Vec<Version>) -> DocumentAggregate {
    DocumentAggregate {
        document,
        versions: Some(versions),
        audit: None,
        from_cache: false,
    }
}

fn transition_reason(target: VersionStatus) -> &'static str {
    match target {
        VersionStatus::Draft => "returned to draft",
        VersionStatus::InReview => "submitted for review",
        VersionStatus::Approved => "approved",
        VersionStatus::Published => "published",
        VersionStatus::Archived => "archived",
    }
}

fn changed_version_fields(update: &VersionUpdate) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if update.summary.is_some() {
        changed.push("summary");
    }
    if update.change_summary.is_some() {
        changed.push("change_summary");
    }
    if update.content.is_some() {
        changed.push("content");
    }
    if update.external_url.is_some() {
        changed.push("external_url");
    }
    if update.effective_at.is_some() {
        changed.push("effective_at");
    }
    changed
}

// ─── Tests ───────────────────────────────────────────────────────────
