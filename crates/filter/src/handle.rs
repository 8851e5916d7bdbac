//! Worker handle for supervisor and ingress communication
//!
//! `WorkerHandle` wraps a worker's mailbox sender, letting the supervisor
//! forward control messages and the ingress path push events without
//! knowing the worker task itself.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use sift_config::FieldMap;
use sift_protocol::{Event, EventType, SubscriberHandle, Subscription};

use crate::error::{FilterError, Result};
use crate::metrics::{WorkerMetrics, WorkerMetricsSnapshot};

/// Messages processed by a filter worker, one at a time in arrival order
pub(crate) enum WorkerMsg {
    /// Replace a subscriber's whole subscription set on this worker
    ///
    /// An empty `subs` is the canonical clear. `done` fires after the set
    /// has been applied.
    Refresh {
        subscriber: SubscriberHandle,
        subs: Vec<Subscription>,
        done: Option<oneshot::Sender<()>>,
    },

    /// Atomically replace the worker's field map snapshot
    ReloadFieldMap {
        field_map: FieldMap,
        ack: oneshot::Sender<()>,
    },

    /// An event to match and deliver
    Event(Arc<Event>),

    /// A watched subscriber endpoint terminated
    SubscriberClosed(sift_protocol::SubscriberId),

    /// Stop the worker
    Shutdown,
}

/// Non-blocking event push failure
///
/// The event is dropped in both cases; ingress is fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    /// Worker mailbox is saturated
    #[error("filter worker mailbox full")]
    Full,

    /// Worker has terminated
    #[error("filter worker mailbox closed")]
    Closed,
}

/// Handle to a filter worker
///
/// Control messages (refresh, reload, shutdown) use awaited sends: worker
/// handlers are prompt, so the wait is bounded by mailbox drain. Event
/// pushes use `try_push_event` so ingress never blocks on a saturated
/// worker.
#[derive(Clone)]
pub struct WorkerHandle {
    /// Event type this worker owns
    event_type: EventType,

    /// Mailbox sender
    sender: mpsc::Sender<WorkerMsg>,

    /// Worker metrics, readable after the worker task consumed itself
    metrics: Arc<WorkerMetrics>,
}

impl WorkerHandle {
    /// Create a new worker handle
    pub(crate) fn new(
        event_type: EventType,
        sender: mpsc::Sender<WorkerMsg>,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            event_type,
            sender,
            metrics,
        }
    }

    /// Get the event type this worker owns
    #[inline]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Replace `subscriber`'s subscription set on this worker
    ///
    /// `subs` may be empty, meaning "remove all for this subscriber on this
    /// type". `done` fires once the worker has applied the set.
    ///
    /// # Errors
    ///
    /// Returns `WorkerUnavailable` when the worker has terminated.
    pub async fn refresh(
        &self,
        subscriber: SubscriberHandle,
        subs: Vec<Subscription>,
        done: Option<oneshot::Sender<()>>,
    ) -> Result<()> {
        self.sender
            .send(WorkerMsg::Refresh {
                subscriber,
                subs,
                done,
            })
            .await
            .map_err(|_| FilterError::WorkerUnavailable {
                event_type: self.event_type.clone(),
            })
    }

    /// Atomically replace the worker's field map, waiting for its ack
    ///
    /// # Errors
    ///
    /// Returns `ReloadTimeout` when the worker misses `deadline` and
    /// `WorkerUnavailable` when it has terminated.
    pub async fn reload_field_map(&self, field_map: FieldMap, deadline: Duration) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();

        self.sender
            .send(WorkerMsg::ReloadFieldMap {
                field_map,
                ack: ack_tx,
            })
            .await
            .map_err(|_| FilterError::WorkerUnavailable {
                event_type: self.event_type.clone(),
            })?;

        match tokio::time::timeout(deadline, ack_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(FilterError::WorkerUnavailable {
                event_type: self.event_type.clone(),
            }),
            Err(_) => Err(FilterError::ReloadTimeout {
                event_type: self.event_type.clone(),
            }),
        }
    }

    /// Push an event without blocking
    ///
    /// This is the ingress hot path; a saturated or terminated worker means
    /// the event is dropped.
    #[inline]
    pub fn try_push_event(&self, event: Arc<Event>) -> std::result::Result<(), PushError> {
        self.sender
            .try_send(WorkerMsg::Event(event))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => PushError::Full,
                mpsc::error::TrySendError::Closed(_) => PushError::Closed,
            })
    }

    /// Push an event, waiting for mailbox capacity
    ///
    /// # Errors
    ///
    /// Returns `WorkerUnavailable` when the worker has terminated.
    pub async fn push_event(&self, event: Arc<Event>) -> Result<()> {
        self.sender
            .send(WorkerMsg::Event(event))
            .await
            .map_err(|_| FilterError::WorkerUnavailable {
                event_type: self.event_type.clone(),
            })
    }

    /// Ask the worker to stop, without waiting for mailbox capacity
    ///
    /// A worker with a saturated mailbox will instead terminate via its
    /// idle TTL once its subscribers are gone.
    pub(crate) fn try_shutdown(&self) {
        let _ = self.sender.try_send(WorkerMsg::Shutdown);
    }

    /// Check if the worker has terminated
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Get the current free capacity of the worker's mailbox
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Get a point-in-time snapshot of the worker's metrics
    #[inline]
    pub fn metrics_snapshot(&self) -> WorkerMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("event_type", &self.event_type)
            .field("closed", &self.is_closed())
            .finish()
    }
}
