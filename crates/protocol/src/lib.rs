//! Sift Protocol - Core types for the sift event gateway
//!
//! This crate provides the foundational types that flow through the gateway:
//! - `Event` / `EventType` - Typed events with JSON payloads
//! - `FieldValue` - Extracted payload values with typed equality
//! - `Subscription` / `Constraint` - Per-subscriber event filters
//! - `SubscriberHandle` - Addressable, liveness-observable delivery endpoint
//!
//! # Design Principles
//!
//! - **Arc-friendly**: Events are wrapped in `Arc` once at ingress and shared
//!   across every matching subscriber without copying the payload
//! - **Typed equality**: `FieldValue` compares numerics by value, strings by
//!   bytes, booleans nominally - and hashes consistently so values can key
//!   inverted indexes
//! - **Non-blocking delivery**: `SubscriberHandle::try_deliver` never waits;
//!   saturated or dead endpoints are reported, not retried

mod error;
mod event;
mod subscriber;
mod subscription;
mod value;

pub use error::DeliveryError;
pub use event::{Event, EventType};
pub use subscriber::{SubscriberHandle, SubscriberId};
pub use subscription::{Constraint, Subscription};
pub use value::FieldValue;

/// Default capacity for subscriber delivery channels
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

// Test modules - only compiled during testing
#[cfg(test)]
mod subscriber_test;
#[cfg(test)]
mod value_test;
