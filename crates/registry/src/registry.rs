//! The worker registry
//!
//! Written only by the supervisor; read concurrently from ingress.

use std::collections::HashMap;

use parking_lot::RwLock;

use sift_protocol::EventType;

/// Concurrent `event_type -> handle` lookup
///
/// `H` is the worker endpoint type, cloned out on lookup. Handles are cheap
/// clones (channel senders), so readers never hold the lock across a send.
///
/// # Invariants
///
/// - At most one live entry per event type
/// - Entries are removed when their worker terminates (the supervisor uses
///   `remove_if` so a replacement worker registered in the meantime is not
///   evicted by a stale exit notice)
#[derive(Debug, Default)]
pub struct Registry<H> {
    entries: RwLock<HashMap<EventType, H>>,
}

impl<H: Clone> Registry<H> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handle for an event type
    ///
    /// Replaces any existing entry. Only the supervisor calls this.
    pub fn register(&self, event_type: EventType, handle: H) {
        self.entries.write().insert(event_type, handle);
    }

    /// Look up the handle for an event type
    ///
    /// This is the ingress hot path: a read lock and a clone.
    pub fn lookup(&self, event_type: &EventType) -> Option<H> {
        self.entries.read().get(event_type).cloned()
    }

    /// Remove the entry for an event type
    ///
    /// Returns the removed handle if one was registered.
    pub fn unregister(&self, event_type: &EventType) -> Option<H> {
        self.entries.write().remove(event_type)
    }

    /// Remove the entry for an event type if it satisfies a predicate
    ///
    /// Returns true when an entry was removed. Used by the supervisor to
    /// clean up after a worker exit without evicting a replacement that
    /// registered in the meantime.
    pub fn remove_if(&self, event_type: &EventType, predicate: impl FnOnce(&H) -> bool) -> bool {
        let mut entries = self.entries.write();
        match entries.get(event_type) {
            Some(handle) if predicate(handle) => {
                entries.remove(event_type);
                true
            }
            _ => false,
        }
    }

    /// Number of registered workers
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether no workers are registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the registered event types
    pub fn event_types(&self) -> Vec<EventType> {
        self.entries.read().keys().cloned().collect()
    }
}
