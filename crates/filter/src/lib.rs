//! Sift Filter - event filter supervision and matching
//!
//! The core of the gateway: a per-node supervisor that locates or starts one
//! filter worker per active event type, workers that index subscriptions and
//! match incoming events against them, and the ingress dispatch that hands
//! events to the right worker.
//!
//! # Design
//!
//! - Each worker is an owned task with a bounded mailbox; messages are
//!   processed one at a time in arrival order
//! - The supervisor is the sole writer of the shared `WorkerRegistry`;
//!   ingress callers only read it
//! - Subscription refreshes replace a subscriber's whole set per type;
//!   passing the previous set lets the supervisor clear types the new set
//!   no longer mentions
//! - Config reloads are atomic: on any failure the previous extractor map
//!   stays in effect
//! - Workers never call back into the supervisor; they only emit outbound
//!   deliveries and lifecycle signals
//!
//! # Example
//!
//! ```no_run
//! use sift_filter::{dispatch, Event, Subscription, SubscriberHandle, SubscriberId, Supervisor};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> sift_filter::Result<()> {
//! let (supervisor, _join) = Supervisor::spawn_local(Some(
//!     r#"{"order.created": {"region": {"kind": "json_path", "path": "$.region", "type": "string"}}}"#
//!         .to_string(),
//! ))?;
//!
//! let (tx, mut rx) = mpsc::channel(256);
//! let subscriber = SubscriberHandle::new(SubscriberId::new(1), tx);
//! let subs = vec![Subscription::match_all("order.created")];
//!
//! let ticket = supervisor
//!     .refresh_subscriptions(subscriber, subs, Vec::new())
//!     .await?;
//! ticket.completed().await;
//!
//! let event = Event::new("order.created", serde_json::json!({"region": "EU"}));
//! dispatch(supervisor.registry(), event);
//!
//! let delivered = rx.recv().await.unwrap();
//! assert_eq!(delivered.event_type().as_str(), "order.created");
//! # Ok(())
//! # }
//! ```

mod error;
mod group;
mod handle;
mod ingress;
mod metrics;
mod supervisor;
mod worker;

pub use error::{FilterError, Result};
pub use group::{LocalGroup, ProcessGroup};
pub use handle::{PushError, WorkerHandle};
pub use ingress::{dispatch, DispatchOutcome};
pub use metrics::{SupervisorMetricsSnapshot, WorkerMetricsSnapshot};
pub use supervisor::{FilterSettings, RefreshTicket, Supervisor, SupervisorHandle};

/// Registry instantiation used by this node: event type to live worker
pub type WorkerRegistry = sift_registry::Registry<WorkerHandle>;

// Re-export the types that cross the public API for convenience
pub use sift_config::{ExtractorMap, FieldMap};
pub use sift_protocol::{
    Constraint, Event, EventType, FieldValue, SubscriberHandle, SubscriberId, Subscription,
};
