//! The audit sink trait and the in-memory hash-chained log.

use parking_lot::Mutex;
use thiserror::Error;

use plcy_core::{AuditEventId, DocumentId, Timestamp};

use crate::event::{AuditEvent, NewAuditEvent, GENESIS_HASH};

/// Errors from an audit sink.
#[derive(Error, Debug, Clone)]
pub enum AuditError {
    /// The sink could not persist the event.
    #[error("audit sink failure: {0}")]
    Sink(String),
}

/// One page of a document's audit history, newest-first.
#[derive(Debug, Clone)]
pub struct AuditPage {
    /// The events in this page.
    pub events: Vec<AuditEvent>,
    /// Cursor for the next page, if more events remain. Opaque to callers.
    pub next_cursor: Option<AuditEventId>,
}

/// Where audit events land. Implementations must be append-only: events
/// are never updated or deleted once accepted.
pub trait AuditSink: Send + Sync {
    /// Append an event, chaining its hash to the previous event.
    fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, AuditError>;

    /// A document's events, newest-first, paginated.
    ///
    /// `cursor` is the `next_cursor` of the previous page (`None` for the
    /// first page); `limit` caps the page size. A zero limit is treated
    /// as one, so the walk always advances.
    fn events_for(
        &self,
        document_id: DocumentId,
        limit: usize,
        cursor: Option<AuditEventId>,
    ) -> Result<AuditPage, AuditError>;

    /// Total number of events in the log, across all documents.
    fn event_count(&self) -> usize;
}

/// In-memory append-only audit log with a SHA-256 hash chain.
///
/// The chain is global (one chain for the whole log, not per document),
/// starting from a zero genesis hash.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events in append order, for chain verification
    /// and operational inspection.
    pub fn all_events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, AuditError> {
        let mut events = self.events.lock();
        let previous_hash = events.last().map(|e| e.event_hash.clone());
        let previous = previous_hash.as_deref().unwrap_or(GENESIS_HASH);

        let id = AuditEventId::new();
        let event_hash = AuditEvent::chain_hash(previous, &event, &id);
        let appended = AuditEvent {
            id,
            document_id: event.document_id,
            version_id: event.version_id,
            action: event.action,
            actor: event.actor,
            metadata: event.metadata,
            previous_hash,
            event_hash,
            created_at: Timestamp::now(),
        };
        events.push(appended.clone());
        Ok(appended)
    }

    fn events_for(
        &self,
        document_id: DocumentId,
        limit: usize,
        cursor: Option<AuditEventId>,
    ) -> Result<AuditPage, AuditError> {
        // A zero limit would return an empty page with no cursor, silently
        // ending the walk while events remain. Hand back one event instead.
        let limit = limit.max(1);
        let events = self.events.lock();
        let newest_first = events
            .iter()
            .rev()
            .filter(|e| e.document_id == document_id);

        // Skip everything up to and including the cursor event.
        let mut remaining: Vec<&AuditEvent> = match cursor {
            Some(cursor) => newest_first
                .skip_while(|e| e.id != cursor)
                .skip(1)
                .collect(),
            None => newest_first.collect(),
        };

        let has_more = remaining.len() > limit;
        remaining.truncate(limit);
        let next_cursor = if has_more {
            remaining.last().map(|e| e.id)
        } else {
            None
        };

        Ok(AuditPage {
            events: remaining.into_iter().cloned().collect(),
            next_cursor,
        })
    }

    fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}
