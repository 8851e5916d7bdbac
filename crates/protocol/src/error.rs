//! Protocol error types

use thiserror::Error;

/// Delivery outcome for a subscriber endpoint
///
/// Delivery is best-effort and non-blocking; both variants mean the event
/// was dropped for that subscriber, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Subscriber mailbox is saturated
    #[error("subscriber mailbox full")]
    Full,

    /// Subscriber endpoint is dead
    #[error("subscriber endpoint closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(DeliveryError::Full.to_string().contains("full"));
        assert!(DeliveryError::Closed.to_string().contains("closed"));
    }
}
