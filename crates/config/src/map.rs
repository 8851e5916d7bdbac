//! Extractor maps
//!
//! The current snapshot of `event_type -> field_name -> extractor spec`.
//! Loaded at supervisor init and replaced atomically on reload; workers hold
//! per-type `FieldMap` snapshots delivered to them by messages.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sift_protocol::EventType;

use crate::error::{ConfigError, Result};
use crate::spec::ExtractorSpec;

/// The indexable fields of one event type
///
/// May be empty: the type is known but has no indexable fields, so only
/// unconstrained subscriptions can match its events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: HashMap<String, ExtractorSpec>,
}

impl FieldMap {
    /// Create an empty field map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the extractor for a field
    #[inline]
    pub fn get(&self, field: &str) -> Option<&ExtractorSpec> {
        self.fields.get(field)
    }

    /// Check whether a field is indexable under this map
    #[inline]
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Add or replace a field's extractor
    #[inline]
    pub fn insert(&mut self, field: impl Into<String>, spec: ExtractorSpec) {
        self.fields.insert(field.into(), spec);
    }

    /// Number of indexable fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the map has no indexable fields
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, spec)` pairs
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtractorSpec)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, ExtractorSpec)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, ExtractorSpec)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Validate every extractor spec in a field map
///
/// Every field map accepted into an `ExtractorMap` must pass; the supervisor
/// also re-validates per type during reload so a failure names the offending
/// type and field.
pub fn check_filter_config(event_type: &str, field_map: &FieldMap) -> Result<()> {
    for (field, spec) in field_map.iter() {
        spec.validate()
            .map_err(|reason| ConfigError::invalid(event_type, field.clone(), reason))?;
    }
    Ok(())
}

/// The full mapping from event types to their indexable fields
///
/// # Example
///
/// ```
/// use sift_config::ExtractorMap;
///
/// let map = ExtractorMap::load(
///     r#"{"order.created": {"region": {"kind": "json_path", "path": "$.region", "type": "string"}}}"#,
/// )
/// .unwrap();
///
/// assert!(map.for_event_type(&"order.created".into()).contains_field("region"));
/// assert!(map.for_event_type(&"unknown".into()).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractorMap {
    types: HashMap<EventType, FieldMap>,
}

impl ExtractorMap {
    /// Create an empty extractor map
    ///
    /// The gateway starts with this when no source is configured; nothing
    /// with constraints matches until a reload supplies field maps.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an extractor map from a path or an inline JSON string
    ///
    /// Selection is by heuristic: an existing filesystem path wins,
    /// otherwise the source is parsed as inline JSON. A blank source yields
    /// an empty map.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Load` when the path exists but cannot be read
    /// - `ConfigError::Parse` when the content is malformed
    /// - `ConfigError::Invalid` when any extractor spec is malformed
    pub fn load(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::new());
        }

        let path = Path::new(source);
        if path.exists() {
            let contents =
                fs::read_to_string(path).map_err(|e| ConfigError::load(source, e))?;
            return contents.parse();
        }

        // Sources that look like a JSON document parse inline; anything
        // else is a missing file
        if source.trim_start().starts_with('{') {
            return source.parse();
        }

        Err(ConfigError::load(
            source,
            io::Error::new(
                io::ErrorKind::NotFound,
                "no such file and not an inline JSON document",
            ),
        ))
    }

    /// Get the field map for an event type
    ///
    /// Unknown types get an empty field map: the worker starts, but only
    /// unconstrained subscriptions can match.
    pub fn for_event_type(&self, event_type: &EventType) -> FieldMap {
        self.types.get(event_type).cloned().unwrap_or_default()
    }

    /// Check whether an event type is declared in this map
    #[inline]
    pub fn contains_type(&self, event_type: &EventType) -> bool {
        self.types.contains_key(event_type)
    }

    /// Add or replace an event type's field map
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the field map fails validation;
    /// the map is not modified in that case.
    pub fn insert(&mut self, event_type: impl Into<EventType>, field_map: FieldMap) -> Result<()> {
        let event_type = event_type.into();
        check_filter_config(event_type.as_str(), &field_map)?;
        self.types.insert(event_type, field_map);
        Ok(())
    }

    /// Iterate over the declared event types
    #[inline]
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.types.keys()
    }

    /// Number of declared event types
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether no event types are declared
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromStr for ExtractorMap {
    type Err = ConfigError;

    /// Parse an inline JSON document and validate every field map
    fn from_str(s: &str) -> Result<Self> {
        let types: HashMap<EventType, FieldMap> = serde_json::from_str(s)?;

        for (event_type, field_map) in &types {
            check_filter_config(event_type.as_str(), field_map)?;
        }

        Ok(Self { types })
    }
}
