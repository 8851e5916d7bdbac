//! Sift Configuration - Extractor maps
//!
//! JSON-based configuration describing which payload fields are indexable
//! per event type, and how to pull them out of a raw event.
//!
//! The document is a mapping `event_type -> field_name -> extractor spec`:
//!
//! ```json
//! {
//!   "order.created": {
//!     "region": { "kind": "json_path", "path": "$.region", "type": "string" },
//!     "total":  { "kind": "json_pointer", "pointer": "/amounts/total", "type": "float" }
//!   },
//!   "heartbeat": {}
//! }
//! ```
//!
//! Every field map is validated on load; an event type may legally map to an
//! empty field map (the type is known but has no indexable fields).
//!
//! # Loading
//!
//! `ExtractorMap::load` accepts either a filesystem path or an inline JSON
//! string, selected by heuristic (path existence first, then parseability):
//!
//! ```
//! use sift_config::ExtractorMap;
//!
//! let map = ExtractorMap::load(r#"{"order.created": {}}"#).unwrap();
//! assert_eq!(map.len(), 1);
//! ```
//!
//! These are pure functions; keeping them here leaves the supervisor's
//! reload logic free of format concerns.

mod error;
mod map;
mod spec;

pub use error::{ConfigError, Result};
pub use map::{check_filter_config, ExtractorMap, FieldMap};
pub use spec::{ExtractionError, ExtractorSpec, ValueKind};

// Test modules - only compiled during testing
#[cfg(test)]
mod map_test;
