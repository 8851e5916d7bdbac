//! Supervisor process group
//!
//! A small discovery facility: every live supervisor registers itself under
//! the group, and `processes()` enumerates the members. Cluster deployments
//! plug in their own membership primitive; the local implementation covers
//! a single node.

use parking_lot::RwLock;

use crate::supervisor::SupervisorHandle;

/// Membership facility for supervisors across a cluster
pub trait ProcessGroup: Send + Sync {
    /// Register a live supervisor
    fn register(&self, handle: SupervisorHandle);

    /// Enumerate the live supervisors
    fn members(&self) -> Vec<SupervisorHandle>;
}

/// Single-node process group
///
/// Holds the local supervisor handle(s); handles whose supervisor has shut
/// down are compacted on read.
#[derive(Default)]
pub struct LocalGroup {
    members: RwLock<Vec<SupervisorHandle>>,
}

impl LocalGroup {
    /// Create an empty group
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessGroup for LocalGroup {
    fn register(&self, handle: SupervisorHandle) {
        self.members.write().push(handle);
    }

    fn members(&self) -> Vec<SupervisorHandle> {
        let mut members = self.members.write();
        members.retain(|h| !h.is_closed());
        members.clone()
    }
}
