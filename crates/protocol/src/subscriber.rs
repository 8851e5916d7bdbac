//! Subscriber endpoints
//!
//! `SubscriberHandle` wraps a channel sender and a stable identifier,
//! allowing filter workers to deliver events to subscribers without knowing
//! their concrete transport.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::DeliveryError;
use crate::event::Event;

/// Stable identifier for a subscriber
///
/// The reference token of the liveness contract: workers key their
/// subscription state and liveness watches by `SubscriberId`, which stays
/// valid across clones of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Create a new subscriber ID
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value of this ID
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

impl From<u64> for SubscriberId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Handle to a live subscriber for event delivery
///
/// Filter workers use `SubscriberHandle` to deliver matched events without
/// knowing the outward-facing transport behind it. The handle is created
/// when a subscriber connects and becomes dead when the receiving side is
/// dropped.
///
/// # Liveness
///
/// `closed()` resolves when the endpoint terminates; workers watch it to
/// purge subscriptions of dead subscribers.
///
/// # Example
///
/// ```
/// use sift_protocol::{SubscriberHandle, SubscriberId};
/// use tokio::sync::mpsc;
///
/// let (tx, _rx) = mpsc::channel(256);
/// let handle = SubscriberHandle::new(SubscriberId::new(1), tx);
/// assert!(!handle.is_closed());
/// ```
#[derive(Clone)]
pub struct SubscriberHandle {
    /// Stable identifier, valid across clones
    id: SubscriberId,

    /// Bounded delivery channel
    ///
    /// Uses `Arc<Event>` so fan-out to many subscribers shares one payload.
    sender: mpsc::Sender<Arc<Event>>,
}

impl SubscriberHandle {
    /// Create a new subscriber handle
    #[inline]
    pub fn new(id: SubscriberId, sender: mpsc::Sender<Arc<Event>>) -> Self {
        Self { id, sender }
    }

    /// Get the subscriber's stable identifier
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Deliver an event without blocking
    ///
    /// Returns `DeliveryError::Full` when the subscriber's mailbox is
    /// saturated and `DeliveryError::Closed` when the endpoint is dead.
    /// Callers drop the event in both cases; delivery is best-effort.
    #[inline]
    pub fn try_deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Check if the endpoint is dead
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Wait until the endpoint terminates
    ///
    /// This is the liveness-watch primitive: resolves once the receiving
    /// side of the subscriber's channel is dropped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Get the current free capacity of the delivery channel
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Get the maximum capacity of the delivery channel
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
