//! Configuration error types

use std::io;

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating extractor configuration
///
/// All three variants leave the caller's previous configuration untouched;
/// reload is atomic.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source is neither a readable file nor parseable inline JSON
    #[error("failed to load extractor config from '{source_desc}': {source}")]
    Load {
        /// The config source as given (path or truncated inline form)
        source_desc: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Content is malformed JSON or does not match the document shape
    #[error("failed to parse extractor config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field map contains a malformed extractor spec
    #[error("invalid extractor for '{event_type}.{field}': {reason}")]
    Invalid {
        /// Event type owning the field map
        event_type: String,
        /// Field whose extractor is malformed
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Create a Load error
    pub fn load(source_desc: impl Into<String>, source: io::Error) -> Self {
        Self::Load {
            source_desc: source_desc.into(),
            source,
        }
    }

    /// Create an Invalid error
    pub fn invalid(
        event_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            event_type: event_type.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = ConfigError::load(
            "/etc/sift/extractors.json",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/etc/sift/extractors.json"));
    }

    #[test]
    fn test_invalid_error_display() {
        let err = ConfigError::invalid("order.created", "region", "empty path");
        assert!(err.to_string().contains("order.created.region"));
        assert!(err.to_string().contains("empty path"));
    }
}
