//! Ingress dispatch
//!
//! The entry point for the event stream: locate the worker for an event's
//! type and hand the event over. Workers exist iff someone subscribed (or a
//! refresh started them); an event for a type without a worker is dropped,
//! never spawns one.

use std::sync::Arc;

use sift_protocol::Event;

use crate::handle::PushError;
use crate::WorkerRegistry;

/// Outcome of handing one event to the filter subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Queued on the worker's mailbox; matching happens asynchronously
    Queued,

    /// No live worker for the event's type; the event was dropped
    NoWorker,

    /// The worker's mailbox is saturated; the event was dropped
    MailboxFull,
}

/// Hand an event to the worker for its type
///
/// Non-blocking: the event is either queued or dropped. A terminated
/// worker whose registry entry is still pending cleanup counts as absent.
pub fn dispatch(registry: &WorkerRegistry, event: Event) -> DispatchOutcome {
    let Some(handle) = registry.lookup(event.event_type()) else {
        tracing::trace!(
            event_type = %event.event_type(),
            "no filter worker for event type, dropping event"
        );
        return DispatchOutcome::NoWorker;
    };

    match handle.try_push_event(Arc::new(event)) {
        Ok(()) => DispatchOutcome::Queued,
        Err(PushError::Closed) => {
            tracing::trace!(
                event_type = %handle.event_type(),
                "filter worker terminated, dropping event"
            );
            DispatchOutcome::NoWorker
        }
        Err(PushError::Full) => {
            tracing::debug!(
                event_type = %handle.event_type(),
                "filter worker mailbox full, dropping event"
            );
            DispatchOutcome::MailboxFull
        }
    }
}
