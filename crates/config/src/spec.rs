//! Extractor specs
//!
//! An extractor spec is a declarative rule for pulling a typed value out of
//! a raw event payload. Specs are validated at load time; extraction runs
//! per event in the worker's hot path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sift_protocol::FieldValue;

/// Expected primitive type of an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// Integral number (integral floats accepted)
    Integer,
    /// Any number
    Float,
    /// Boolean
    Boolean,
}

impl ValueKind {
    /// Name used in validation and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Check an extracted value against the expected type
    fn accepts(self, value: &FieldValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => matches!(value, FieldValue::Int(_)),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_bool(),
        }
    }
}

/// Per-event extraction failure
///
/// Suppressed to a non-match by the worker: logged, counted, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Value at the target location has the wrong type
    #[error("expected {expected} at '{location}', found {found}")]
    TypeMismatch {
        /// Path or pointer that was evaluated
        location: String,
        /// Type the spec expects
        expected: &'static str,
        /// JSON type actually found
        found: &'static str,
    },

    /// Value at the target location is not a scalar
    #[error("non-scalar value at '{location}'")]
    NonScalar {
        /// Path or pointer that was evaluated
        location: String,
    },
}

/// A declarative rule for extracting one typed value from an event payload
///
/// Tagged by `kind` in the config document. Two kinds are supported:
///
/// - `json_path` - a dot path rooted at `$` (`$.amounts.total`)
/// - `json_pointer` - an RFC 6901 pointer (`/amounts/total`)
///
/// Both resolve against the event payload and check the result against the
/// declared `type`. An absent location is not an error - the field simply
/// has no value for that event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractorSpec {
    /// Dot path rooted at `$`
    JsonPath {
        /// Path into the payload, e.g. `$.region`
        path: String,
        /// Expected primitive type
        #[serde(rename = "type")]
        expected: ValueKind,
    },

    /// RFC 6901 JSON pointer
    JsonPointer {
        /// Pointer into the payload, e.g. `/amounts/total`
        pointer: String,
        /// Expected primitive type
        #[serde(rename = "type")]
        expected: ValueKind,
    },
}

impl ExtractorSpec {
    /// Validate that this spec is well-formed
    ///
    /// Called for every spec accepted into an extractor map. Returns the
    /// reason when malformed; the caller wraps it into `ConfigError`.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::JsonPath { path, .. } => {
                let Some(rest) = path.strip_prefix("$.") else {
                    return Err(format!("json_path must start with '$.': '{path}'"));
                };
                if rest.is_empty() || rest.split('.').any(str::is_empty) {
                    return Err(format!("json_path has an empty segment: '{path}'"));
                }
                Ok(())
            }
            Self::JsonPointer { pointer, .. } => {
                if !pointer.starts_with('/') {
                    return Err(format!("json_pointer must start with '/': '{pointer}'"));
                }
                Ok(())
            }
        }
    }

    /// Extract a value from an event payload
    ///
    /// Returns `Ok(None)` when the target location is absent (common, not an
    /// error) and `Err` when the value exists but has the wrong shape.
    pub fn extract(
        &self,
        payload: &serde_json::Value,
    ) -> std::result::Result<Option<FieldValue>, ExtractionError> {
        let (raw, location) = match self {
            Self::JsonPath { path, .. } => (resolve_dot_path(payload, path), path.as_str()),
            Self::JsonPointer { pointer, .. } => (payload.pointer(pointer), pointer.as_str()),
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        // JSON null counts as absent, same as a missing key
        if raw.is_null() {
            return Ok(None);
        }

        let value = FieldValue::from_json(raw).ok_or_else(|| ExtractionError::NonScalar {
            location: location.to_string(),
        })?;

        if !self.expected().accepts(&value) {
            return Err(ExtractionError::TypeMismatch {
                location: location.to_string(),
                expected: self.expected().as_str(),
                found: json_type_name(raw),
            });
        }

        Ok(Some(value))
    }

    /// Expected primitive type of this spec
    #[inline]
    pub fn expected(&self) -> ValueKind {
        match self {
            Self::JsonPath { expected, .. } | Self::JsonPointer { expected, .. } => *expected,
        }
    }
}

/// Resolve a `$.a.b.c` dot path against a payload
///
/// Validation guarantees the `$.` prefix and non-empty segments; a missing
/// prefix at runtime just resolves to nothing.
fn resolve_dot_path<'a>(
    payload: &'a serde_json::Value,
    path: &str,
) -> Option<&'a serde_json::Value> {
    let rest = path.strip_prefix("$.")?;
    rest.split('.')
        .try_fold(payload, |current, segment| current.get(segment))
}

/// JSON type name for error messages
fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
