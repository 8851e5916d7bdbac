//! Sift Registry - event-type to worker-endpoint lookup
//!
//! A concurrent map from event types to live worker handles, shared between
//! the supervisor (sole writer) and the ingress path (concurrent readers).
//!
//! # Design
//!
//! - Single-writer discipline: only the supervisor registers and removes
//!   entries; ingress callers only `lookup`
//! - At most one live worker per event type per node; entries are removed
//!   when their worker terminates
//! - `lookup` clones the handle out of the read lock, so readers never hold
//!   the lock across a send
//!
//! # Example
//!
//! ```
//! use sift_registry::Registry;
//!
//! let registry: Registry<&'static str> = Registry::new();
//! registry.register("order.created".into(), "worker-endpoint");
//! assert_eq!(registry.lookup(&"order.created".into()), Some("worker-endpoint"));
//! ```

mod registry;

pub use registry::Registry;

#[cfg(test)]
mod registry_test;
