//! Filter error types
//!
//! Downstream failures (extraction, delivery) are counters and logs, never
//! errors on the event path; this taxonomy covers the control plane.

use thiserror::Error;

use sift_protocol::EventType;

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Filter control-plane errors
#[derive(Debug, Error)]
pub enum FilterError {
    /// Config load, parse, or validation failure; the previous extractor
    /// map stays in effect
    #[error(transparent)]
    Config(#[from] sift_config::ConfigError),

    /// A worker missed its reload deadline; the reload was aborted
    #[error("config reload timed out for filter worker '{event_type}'")]
    ReloadTimeout {
        /// Event type of the unresponsive worker
        event_type: EventType,
    },

    /// The worker's mailbox is closed; it has terminated
    #[error("filter worker for '{event_type}' is unavailable")]
    WorkerUnavailable {
        /// Event type of the terminated worker
        event_type: EventType,
    },

    /// The supervisor's mailbox is closed; it has shut down
    #[error("filter supervisor is not running")]
    SupervisorClosed,
}
