//! Tests for ExtractorMap
//!
//! Tests cover the path-vs-inline load heuristic, validation on load, and
//! per-type lookup.

use std::io::Write;

use crate::{check_filter_config, ConfigError, ExtractorMap, ExtractorSpec, FieldMap, ValueKind};

const VALID_DOC: &str = r#"
{
    "order.created": {
        "region": { "kind": "json_path", "path": "$.region", "type": "string" },
        "total": { "kind": "json_pointer", "pointer": "/amounts/total", "type": "float" }
    },
    "heartbeat": {}
}
"#;

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_inline_json() {
    let map = ExtractorMap::load(VALID_DOC).unwrap();
    assert_eq!(map.len(), 2);

    let fields = map.for_event_type(&"order.created".into());
    assert_eq!(fields.len(), 2);
    assert!(fields.contains_field("region"));
    assert!(fields.contains_field("total"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VALID_DOC.as_bytes()).unwrap();

    let map = ExtractorMap::load(file.path().to_str().unwrap()).unwrap();
    assert_eq!(map.len(), 2);
}

#[test]
fn test_blank_source_yields_empty_map() {
    let map = ExtractorMap::load("").unwrap();
    assert!(map.is_empty());

    let map = ExtractorMap::load("   ").unwrap();
    assert!(map.is_empty());
}

#[test]
fn test_load_neither_path_nor_json() {
    let result = ExtractorMap::load("/nonexistent/extractors.json");
    assert!(matches!(result, Err(ConfigError::Load { .. })));
}

#[test]
fn test_load_malformed_json() {
    let result = ExtractorMap::load("{ not json");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_load_rejects_invalid_spec() {
    let doc = r#"{"order.created": {"region": {"kind": "json_path", "path": "region", "type": "string"}}}"#;
    let err = ExtractorMap::load(doc).unwrap_err();
    match err {
        ConfigError::Invalid {
            event_type, field, ..
        } => {
            assert_eq!(event_type, "order.created");
            assert_eq!(field, "region");
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_unknown_type_gets_empty_field_map() {
    let map = ExtractorMap::load(VALID_DOC).unwrap();
    let fields = map.for_event_type(&"unknown.type".into());
    assert!(fields.is_empty());
}

#[test]
fn test_empty_field_map_is_legal() {
    let map = ExtractorMap::load(VALID_DOC).unwrap();
    assert!(map.contains_type(&"heartbeat".into()));
    assert!(map.for_event_type(&"heartbeat".into()).is_empty());
}

#[test]
fn test_event_types_iteration() {
    let map = ExtractorMap::load(VALID_DOC).unwrap();
    let mut types: Vec<&str> = map.event_types().map(|t| t.as_str()).collect();
    types.sort_unstable();
    assert_eq!(types, vec!["heartbeat", "order.created"]);
}

// =============================================================================
// Mutation and validation
// =============================================================================

#[test]
fn test_insert_validates() {
    let mut map = ExtractorMap::new();

    let mut good = FieldMap::new();
    good.insert(
        "region",
        ExtractorSpec::JsonPath {
            path: "$.region".into(),
            expected: ValueKind::String,
        },
    );
    map.insert("order.created", good).unwrap();
    assert_eq!(map.len(), 1);

    let mut bad = FieldMap::new();
    bad.insert(
        "region",
        ExtractorSpec::JsonPath {
            path: "no-prefix".into(),
            expected: ValueKind::String,
        },
    );
    assert!(map.insert("order.paid", bad).is_err());
    assert!(!map.contains_type(&"order.paid".into()));
}

#[test]
fn test_check_filter_config_empty_map_ok() {
    assert!(check_filter_config("heartbeat", &FieldMap::new()).is_ok());
}
