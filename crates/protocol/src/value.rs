//! Extracted field values with typed equality
//!
//! `FieldValue` is the common currency between extractor specs and
//! subscription constraints: numerics compare by value, strings by bytes,
//! booleans nominally.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A scalar value extracted from an event payload
///
/// Equality is typed: `Int(1)` equals a JSON `1.0` because integral floats
/// are canonicalized to `Int` at construction. `Hash` is consistent with
/// `Eq`, so `FieldValue` can key the inverted indexes used for matching.
///
/// # Example
///
/// ```
/// use sift_protocol::FieldValue;
/// use serde_json::json;
///
/// let a = FieldValue::from_json(&json!(1)).unwrap();
/// let b = FieldValue::from_json(&json!(1.0)).unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// UTF-8 string, compared by byte equality
    String(String),
    /// Signed integer (also the canonical form of integral floats)
    Int(i64),
    /// Non-integral floating point value
    Float(f64),
    /// Boolean, compared nominally
    Bool(bool),
}

impl FieldValue {
    /// Convert a JSON scalar into a field value
    ///
    /// Returns `None` for non-scalar JSON (null, arrays, objects).
    /// Numbers are canonicalized: a float that is integral and fits `i64`
    /// becomes `Int`, so `1`, `1.0` and `u64` `1` all compare equal.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Some(Self::canonical_float(f))
                } else {
                    // u64 beyond i64::MAX; keep the value, precision-lossy
                    n.as_u64().map(|u| Self::Float(u as f64))
                }
            }
            _ => None,
        }
    }

    /// Check whether this value is a string
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Check whether this value is numeric (int or float)
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Check whether this value is a boolean
    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Canonicalize a float: integral values in range collapse to `Int`
    fn canonical_float(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f)
        }
    }

    /// Normalized form used by `Eq` and `Hash`
    ///
    /// Floats are re-canonicalized here so that values deserialized directly
    /// into `Float` still compare consistently.
    fn canonical(&self) -> CanonicalRef<'_> {
        match self {
            Self::String(s) => CanonicalRef::Str(s),
            Self::Bool(b) => CanonicalRef::Bool(*b),
            Self::Int(i) => CanonicalRef::Int(*i),
            Self::Float(f) => match Self::canonical_float(*f) {
                Self::Int(i) => CanonicalRef::Int(i),
                _ => CanonicalRef::FloatBits(f.to_bits()),
            },
        }
    }
}

/// Borrowed canonical form; derives give us the typed-equality rules
#[derive(PartialEq, Eq, Hash)]
enum CanonicalRef<'a> {
    Str(&'a str),
    Int(i64),
    FloatBits(u64),
    Bool(bool),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::canonical_float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
