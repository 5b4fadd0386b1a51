//! Typed attribute values.
//!
//! Policies and contexts only ever deal in three primitive kinds: strings,
//! signed integers and booleans. Anything else is rejected at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Value Kind
// ============================================================================

/// The runtime type of an [`AttributeValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Attribute Value
// ============================================================================

/// A string, integer or boolean attribute value.
///
/// Serializes untagged, so a JSON `"Doctor"`, `5` or `true` maps directly
/// onto the matching variant. Floats, `null`, arrays and objects fail to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl AttributeValue {
    /// Returns the runtime type of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Integer(_) => ValueKind::Integer,
            Self::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts a JSON scalar into an attribute value.
    ///
    /// Returns `None` for anything that is not a string, an integer that
    /// fits in `i64`, or a boolean.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Self::Boolean(*b)),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Integer),
            _ => None,
        }
    }

    /// Returns `false` for a string holding both `'` and `"`.
    ///
    /// Policy strings have no escapes, so such a value can live in a
    /// context or a hand-built [`Expr`](crate::Expr) but has no literal
    /// spelling in policy text.
    pub fn has_literal_form(&self) -> bool {
        match self {
            Self::String(s) => !(s.contains('"') && s.contains('\'')),
            Self::Integer(_) | Self::Boolean(_) => true,
        }
    }

    /// Parses a command-line style literal.
    ///
    /// `true`/`false` (any case) become booleans, anything `i64` accepts
    /// becomes an integer, everything else is kept as a string.
    pub fn infer(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            Self::Boolean(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Self::Boolean(false)
        } else if let Ok(i) = raw.parse::<i64>() {
            Self::Integer(i)
        } else {
            Self::String(raw.to_string())
        }
    }
}

/// Renders the value in policy-literal syntax.
///
/// Strings are double-quoted unless they contain a double quote, in which
/// case single quotes are used. The output only re-lexes to the same value
/// when [`has_literal_form`](AttributeValue::has_literal_form) holds.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) if s.contains('"') => write!(f, "'{s}'"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u8> for AttributeValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
