//! Tests for Registry
//!
//! Tests cover register/lookup/unregister, conditional removal, and
//! concurrent reads against the single writer.

use std::sync::Arc;
use std::thread;

use sift_protocol::EventType;

use crate::Registry;

fn t(s: &str) -> EventType {
    EventType::new(s)
}

#[test]
fn test_new_registry_is_empty() {
    let registry: Registry<u32> = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert_eq!(registry.lookup(&t("order.created")), None);
}

#[test]
fn test_register_and_lookup() {
    let registry = Registry::new();
    registry.register(t("order.created"), 1u32);
    registry.register(t("order.paid"), 2u32);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.lookup(&t("order.created")), Some(1));
    assert_eq!(registry.lookup(&t("order.paid")), Some(2));
    assert_eq!(registry.lookup(&t("order.cancelled")), None);
}

#[test]
fn test_register_replaces() {
    let registry = Registry::new();
    registry.register(t("order.created"), 1u32);
    registry.register(t("order.created"), 2u32);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup(&t("order.created")), Some(2));
}

#[test]
fn test_unregister() {
    let registry = Registry::new();
    registry.register(t("order.created"), 1u32);

    assert_eq!(registry.unregister(&t("order.created")), Some(1));
    assert_eq!(registry.unregister(&t("order.created")), None);
    assert!(registry.is_empty());
}

#[test]
fn test_remove_if_predicate_holds() {
    let registry = Registry::new();
    registry.register(t("order.created"), 1u32);

    assert!(registry.remove_if(&t("order.created"), |h| *h == 1));
    assert!(registry.is_empty());
}

#[test]
fn test_remove_if_spares_replacement() {
    let registry = Registry::new();
    registry.register(t("order.created"), 1u32);

    // A replacement worker registered before the stale exit notice arrived
    registry.register(t("order.created"), 2u32);

    assert!(!registry.remove_if(&t("order.created"), |h| *h == 1));
    assert_eq!(registry.lookup(&t("order.created")), Some(2));
}

#[test]
fn test_event_types_snapshot() {
    let registry = Registry::new();
    registry.register(t("a"), 1u32);
    registry.register(t("b"), 2u32);

    let mut types: Vec<String> = registry
        .event_types()
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    types.sort_unstable();
    assert_eq!(types, vec!["a", "b"]);
}

#[test]
fn test_concurrent_readers_with_single_writer() {
    let registry = Arc::new(Registry::new());
    registry.register(t("order.created"), 0u32);

    let mut handles = vec![];

    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                // Readers observe some registered value or a gap, never panic
                let _ = registry.lookup(&t("order.created"));
            }
        }));
    }

    // Single writer churns the entry
    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..1000u32 {
                registry.register(t("order.created"), i);
                if i % 100 == 0 {
                    registry.unregister(&t("order.created"));
                }
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();
}
