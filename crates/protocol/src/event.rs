//! Event identification and payload types
//!
//! `EventType` identifies a class of events sharing a schema; `Event` pairs a
//! type with its raw JSON payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Event type identifier for routing and filtering decisions
///
/// Each event carries a type that the gateway uses to locate the filter
/// worker responsible for it. Subscriptions select a single event type.
///
/// # Example
///
/// ```
/// use sift_protocol::EventType;
///
/// let t = EventType::new("order.created");
/// assert_eq!(t.as_str(), "order.created");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    /// Create a new event type
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the event type as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A typed event with a raw JSON payload
///
/// Events enter the gateway, get matched against the subscriptions indexed
/// by their type's filter worker, and are delivered to matching subscriber
/// endpoints. The payload is kept as raw `serde_json::Value`; extractor
/// specs pull typed values out of it on demand.
///
/// Events are wrapped in `Arc` at ingress so that fan-out to multiple
/// subscribers shares a single allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Type key identifying the event's schema class
    event_type: EventType,

    /// Raw payload; fields are pulled out by extractor specs
    payload: serde_json::Value,
}

impl Event {
    /// Create a new event
    #[inline]
    pub fn new(event_type: impl Into<EventType>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Get the event's type
    #[inline]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Get the raw payload
    #[inline]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}
