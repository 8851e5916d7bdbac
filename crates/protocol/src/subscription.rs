//! Subscription records
//!
//! A subscription selects events of one type whose extracted fields satisfy
//! equality constraints. Records are immutable; refreshes replace whole sets.

use serde::{Deserialize, Serialize};

use crate::event::EventType;
use crate::value::FieldValue;

/// An equality constraint on one extracted payload field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Field name; must be a key of the event type's field map to be live
    pub field: String,

    /// Value the extracted field must equal (typed equality)
    pub expected: FieldValue,
}

impl Constraint {
    /// Create a new constraint
    #[inline]
    pub fn new(field: impl Into<String>, expected: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

/// A filter owned by one subscriber
///
/// Selects events of `event_type` whose extracted fields satisfy every
/// constraint. An empty constraint list matches every event of the type.
/// The owning subscriber is carried alongside the subscription in refresh
/// calls, keeping the record itself immutable and cheap to clone.
///
/// # Example
///
/// ```
/// use sift_protocol::{Constraint, Subscription};
///
/// let sub = Subscription::new("order.created", vec![Constraint::new("region", "EU")]);
/// assert_eq!(sub.event_type().as_str(), "order.created");
/// assert!(!sub.is_match_all());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Event type this subscription selects
    event_type: EventType,

    /// Equality constraints, all of which must hold
    constraints: Vec<Constraint>,
}

impl Subscription {
    /// Create a new subscription
    #[inline]
    pub fn new(event_type: impl Into<EventType>, constraints: Vec<Constraint>) -> Self {
        Self {
            event_type: event_type.into(),
            constraints,
        }
    }

    /// Create a subscription matching every event of the type
    #[inline]
    pub fn match_all(event_type: impl Into<EventType>) -> Self {
        Self::new(event_type, Vec::new())
    }

    /// Get the event type this subscription selects
    #[inline]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Get the constraints
    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Check whether this subscription matches every event of the type
    #[inline]
    pub fn is_match_all(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_accessors() {
        let sub = Subscription::new(
            "order.created",
            vec![
                Constraint::new("region", "EU"),
                Constraint::new("priority", 3i64),
            ],
        );

        assert_eq!(sub.event_type().as_str(), "order.created");
        assert_eq!(sub.constraints().len(), 2);
        assert_eq!(sub.constraints()[0].field, "region");
        assert_eq!(sub.constraints()[1].expected, FieldValue::Int(3));
        assert!(!sub.is_match_all());
    }

    #[test]
    fn test_match_all() {
        let sub = Subscription::match_all("order.created");
        assert!(sub.is_match_all());
        assert!(sub.constraints().is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let sub = Subscription::new("order.paid", vec![Constraint::new("customer", "c1")]);
        let encoded = serde_json::to_string(&sub).unwrap();
        let decoded: Subscription = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, sub);
    }
}
