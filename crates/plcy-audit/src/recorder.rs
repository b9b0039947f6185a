//! Best-effort audit recording with retry and reconciliation.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{AuditEvent, NewAuditEvent};
use crate::log::AuditSink;

/// Records audit events without ever failing the enclosing operation.
///
/// A failed append is retried once. If the retry also fails, the event is
/// parked on the reconciliation queue and the failure is logged at error
/// level — the mutation it describes stays committed, but operators can
/// see the gap and [`drain_pending`](AuditRecorder::drain_pending) it into
/// the sink once the sink recovers.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    pending: Arc<Mutex<Vec<NewAuditEvent>>>,
}

impl AuditRecorder {
    /// Create a recorder writing to the given sink.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append an event, best-effort.
    ///
    /// Returns the appended event, or `None` if both the append and its
    /// retry failed and the event was parked for reconciliation.
    pub fn record(&self, event: NewAuditEvent) -> Option<AuditEvent> {
        match self.sink.append(event.clone()) {
            Ok(appended) => Some(appended),
            Err(first) => {
                tracing::warn!(
                    action = event.action.as_str(),
                    document_id = %event.document_id,
                    error = %first,
                    "audit append failed, retrying once"
                );
                match self.sink.append(event.clone()) {
                    Ok(appended) => Some(appended),
                    Err(second) => {
                        tracing::error!(
                            action = event.action.as_str(),
                            document_id = %event.document_id,
                            error = %second,
                            "audit append failed after retry; parking event for reconciliation"
                        );
                        self.pending.lock().push(event);
                        None
                    }
                }
            }
        }
    }

    /// The sink this recorder writes to (the read path for event listing).
    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    /// Number of events awaiting reconciliation.
    pub fn pending_reconciliation(&self) -> usize {
        self.pending.lock().len()
    }

    /// Take all parked events, leaving the queue empty. Handed to whatever
    /// operational process replays them into the sink.
    pub fn drain_pending(&self) -> Vec<NewAuditEvent> {
        std::mem::take(&mut *self.pending.lock())
    }
}
