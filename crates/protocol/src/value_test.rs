//! Tests for FieldValue
//!
//! Tests cover JSON conversion, typed equality, hash consistency, and the
//! float canonicalization rules.

use std::collections::HashSet;

use serde_json::json;

use crate::FieldValue;

// =============================================================================
// Conversion from JSON
// =============================================================================

#[test]
fn test_from_json_scalars() {
    assert_eq!(
        FieldValue::from_json(&json!("EU")),
        Some(FieldValue::String("EU".into()))
    );
    assert_eq!(FieldValue::from_json(&json!(42)), Some(FieldValue::Int(42)));
    assert_eq!(
        FieldValue::from_json(&json!(true)),
        Some(FieldValue::Bool(true))
    );
    assert_eq!(
        FieldValue::from_json(&json!(1.5)),
        Some(FieldValue::Float(1.5))
    );
}

#[test]
fn test_from_json_non_scalars() {
    assert_eq!(FieldValue::from_json(&json!(null)), None);
    assert_eq!(FieldValue::from_json(&json!([1, 2])), None);
    assert_eq!(FieldValue::from_json(&json!({"a": 1})), None);
}

#[test]
fn test_integral_float_canonicalizes_to_int() {
    assert_eq!(FieldValue::from_json(&json!(7.0)), Some(FieldValue::Int(7)));
    assert_eq!(
        FieldValue::from_json(&json!(-3.0)),
        Some(FieldValue::Int(-3))
    );
}

// =============================================================================
// Typed equality
// =============================================================================

#[test]
fn test_numeric_equality_by_value() {
    let int = FieldValue::from_json(&json!(5)).unwrap();
    let float = FieldValue::from_json(&json!(5.0)).unwrap();
    assert_eq!(int, float);

    // Raw Float(5.0) (not built via from_json) still compares equal
    assert_eq!(FieldValue::Float(5.0), FieldValue::Int(5));
}

#[test]
fn test_string_equality_by_bytes() {
    assert_eq!(FieldValue::from("EU"), FieldValue::from("EU"));
    assert_ne!(FieldValue::from("EU"), FieldValue::from("eu"));
}

#[test]
fn test_cross_type_never_equal() {
    assert_ne!(FieldValue::from("1"), FieldValue::Int(1));
    assert_ne!(FieldValue::Bool(true), FieldValue::Int(1));
}

#[test]
fn test_non_integral_floats() {
    assert_eq!(FieldValue::Float(1.5), FieldValue::Float(1.5));
    assert_ne!(FieldValue::Float(1.5), FieldValue::Float(2.5));
    assert_ne!(FieldValue::Float(1.5), FieldValue::Int(1));
}

// =============================================================================
// Hash consistency (values key the worker's inverted index)
// =============================================================================

#[test]
fn test_hash_consistent_with_eq() {
    let mut set = HashSet::new();
    set.insert(FieldValue::Int(5));

    assert!(set.contains(&FieldValue::Float(5.0)));
    assert!(!set.contains(&FieldValue::Float(5.5)));
}

#[test]
fn test_set_dedups_equal_values() {
    let mut set = HashSet::new();
    set.insert(FieldValue::Int(1));
    set.insert(FieldValue::Float(1.0));
    set.insert(FieldValue::from("1"));

    assert_eq!(set.len(), 2);
}

// =============================================================================
// Display / serde
// =============================================================================

#[test]
fn test_display() {
    assert_eq!(FieldValue::from("EU").to_string(), "EU");
    assert_eq!(FieldValue::Int(42).to_string(), "42");
    assert_eq!(FieldValue::Bool(false).to_string(), "false");
}

#[test]
fn test_serde_untagged_roundtrip() {
    let value: FieldValue = serde_json::from_str("\"EU\"").unwrap();
    assert_eq!(value, FieldValue::from("EU"));

    let value: FieldValue = serde_json::from_str("42").unwrap();
    assert_eq!(value, FieldValue::Int(42));

    let value: FieldValue = serde_json::from_str("true").unwrap();
    assert_eq!(value, FieldValue::Bool(true));
}
