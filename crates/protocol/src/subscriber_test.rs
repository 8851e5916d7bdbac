//! Tests for SubscriberHandle
//!
//! Tests cover delivery outcomes (ok / full / closed) and liveness
//! observation.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use crate::{DeliveryError, Event, SubscriberHandle, SubscriberId};

fn event() -> Arc<Event> {
    Arc::new(Event::new("order.created", json!({"region": "EU"})))
}

#[test]
fn test_subscriber_id() {
    let id = SubscriberId::new(42);
    assert_eq!(id.value(), 42);
    assert_eq!(id.to_string(), "sub:42");
    assert_eq!(SubscriberId::from(42u64), id);
}

#[tokio::test]
async fn test_try_deliver_ok() {
    let (tx, mut rx) = mpsc::channel(4);
    let handle = SubscriberHandle::new(SubscriberId::new(1), tx);

    handle.try_deliver(event()).unwrap();

    let delivered = rx.recv().await.unwrap();
    assert_eq!(delivered.event_type().as_str(), "order.created");
}

#[tokio::test]
async fn test_try_deliver_full() {
    let (tx, _rx) = mpsc::channel(1);
    let handle = SubscriberHandle::new(SubscriberId::new(1), tx);

    handle.try_deliver(event()).unwrap();
    let err = handle.try_deliver(event()).unwrap_err();
    assert_eq!(err, DeliveryError::Full);
}

#[tokio::test]
async fn test_try_deliver_closed() {
    let (tx, rx) = mpsc::channel(4);
    let handle = SubscriberHandle::new(SubscriberId::new(1), tx);

    drop(rx);

    assert!(handle.is_closed());
    let err = handle.try_deliver(event()).unwrap_err();
    assert_eq!(err, DeliveryError::Closed);
}

#[tokio::test]
async fn test_closed_resolves_on_endpoint_death() {
    let (tx, rx) = mpsc::channel::<Arc<Event>>(4);
    let handle = SubscriberHandle::new(SubscriberId::new(7), tx);

    let watcher = tokio::spawn({
        let handle = handle.clone();
        async move {
            handle.closed().await;
            handle.id()
        }
    });

    drop(rx);

    assert_eq!(watcher.await.unwrap(), SubscriberId::new(7));
}

#[tokio::test]
async fn test_clones_share_identity() {
    let (tx, _rx) = mpsc::channel::<Arc<Event>>(4);
    let handle = SubscriberHandle::new(SubscriberId::new(3), tx);
    let clone = handle.clone();

    assert_eq!(handle.id(), clone.id());
    assert_eq!(handle.max_capacity(), clone.max_capacity());
}
