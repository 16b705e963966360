//! Dynamically-typed JSON values.

use indexmap::IndexMap;

/// A JSON value of any shape.
///
/// Integers keep their signedness rather than collapsing to `f64`, so
/// 64-bit identifiers survive a round trip through generic content. Object
/// keys are unique and iterate in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(IndexMap<String, JsonValue>),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a signed integer if it is one, or an unsigned
    /// integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Int(i) => Some(*i),
            JsonValue::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            JsonValue::Uint(u) => Some(*u),
            JsonValue::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Returns any numeric value as a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Int(i) => Some(*i as f64),
            JsonValue::Uint(u) => Some(*u as f64),
            JsonValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, JsonValue>> {
        match self {
            JsonValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key in an object value; `None` for any other shape.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object().and_then(|map| map.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(JsonValue::Int(-3).as_f64(), Some(-3.0));
        assert_eq!(JsonValue::Uint(7).as_i64(), Some(7));
        assert_eq!(JsonValue::Uint(u64::MAX).as_i64(), None);
        assert_eq!(JsonValue::Int(-1).as_u64(), None);
        assert_eq!(JsonValue::String("3".into()).as_f64(), None);
    }

    #[test]
    fn test_object_lookup() {
        let mut map = IndexMap::new();
        map.insert("name".to_string(), JsonValue::String("layer0".into()));
        let value = JsonValue::Object(map);
        assert_eq!(value.get("name").and_then(JsonValue::as_str), Some("layer0"));
        assert!(value.get("missing").is_none());
        assert!(JsonValue::Null.get("name").is_none());
    }
}
