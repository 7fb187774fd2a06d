//! The dynamic value type and its canonical textual encoding.
//!
//! `Value` is the engine's tagged union of everything a caller can store:
//! scalars keep their native textual form when encoded, complex values
//! (`List`/`Map`) serialize to a canonical JSON string. The same encoding
//! is used for on-disk storage, `nochange` comparisons, and full-text
//! indexing, so all three agree on what "the same value" means.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed value.
///
/// `Map` uses a `BTreeMap` (not `HashMap`) specifically so canonical
/// encoding is deterministic: the same logical map always serializes to
/// the same bytes regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The JSON null literal. Valid nested inside `List`/`Map`; rejected
    /// as a top-level stored value by the engine (see `kybase_core::error`).
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// Text scalar. An empty string is rejected as a top-level stored
    /// value by the engine, same as `Null`.
    Text(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Ordered (by key) mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// True for `List`/`Map`, the values that get canonical-JSON encoded
    /// rather than kept in native textual form.
    pub fn is_complex(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// True for the top-level "empty" markers the engine rejects on save.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for an empty text scalar.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Parse caller-supplied text, promoting it to a richer `Value` when
    /// it matches a recognized literal: `"true"`/`"false"`, an integer, a
    /// float, or a JSON object/array. Anything else stays `Text`.
    ///
    /// This is the promotion rule `save(k, v)` applies to textual input,
    /// per the codec's "`save` accepts parsed or textual `v`" contract.
    pub fn parse_literal(raw: &str) -> Value {
        match raw {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if looks_like_json_container(raw) {
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(raw) {
                return Value::from_json(v);
            }
        }
        if raw.contains('.') || raw.contains('e') || raw.contains('E') {
            if let Ok(f) = raw.parse::<f64>() {
                return Value::Float(f);
            }
        }
        Value::Text(raw.to_string())
    }

    /// The canonical textual encoding used for storage, `nochange`
    /// comparisons, and FTS indexing.
    ///
    /// Scalars keep their native textual form (`Text("balu")` encodes to
    /// `balu`, not `"balu"`). Complex values encode to canonical JSON
    /// with map keys in sorted order.
    pub fn canonical_encode(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
            Value::List(_) | Value::Map(_) => {
                serde_json::to_string(&self.to_json()).expect("Value -> JSON never fails")
            }
        }
    }

    /// The same canonical form, used by the search index's stringifier.
    pub fn stringify_for_index(&self) -> String {
        self.canonical_encode()
    }

    /// Convert to a `serde_json::Value` for JSON export/import and
    /// nested (de)serialization.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Convert from a `serde_json::Value`.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect())
            }
        }
    }

    /// Parse the canonical on-disk text back into a `Value`, mirroring
    /// `parse_literal` for scalars and JSON-decoding for complex shapes.
    /// Used when `deserialize=true` is requested on read.
    pub fn from_canonical(text: &str) -> Value {
        Value::parse_literal(text)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_encode())
    }
}

fn looks_like_json_container(s: &str) -> bool {
    let s = s.trim();
    (s.starts_with('{') && s.ends_with('}')) || (s.starts_with('[') && s.ends_with(']'))
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn promotes_booleans_and_integers() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("false"), Value::Bool(false));
        assert_eq!(Value::parse_literal("42"), Value::Int(42));
        assert_eq!(Value::parse_literal("-7"), Value::Int(-7));
    }

    #[test]
    fn promotes_json_object_and_array() {
        let v = Value::parse_literal(r#"{"a": 1, "b": 2}"#);
        match v {
            Value::Map(m) => {
                assert_eq!(m.get("a"), Some(&Value::Int(1)));
                assert_eq!(m.get("b"), Some(&Value::Int(2)));
            }
            other => panic!("expected map, got {other:?}"),
        }
        let v = Value::parse_literal("[1, 2, 3]");
        assert_eq!(v, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(Value::parse_literal("hello world"), Value::Text("hello world".to_string()));
    }

    #[test]
    fn canonical_encoding_is_deterministic_regardless_of_insertion_order() {
        let mut m1 = BTreeMap::new();
        m1.insert("b".to_string(), Value::Int(2));
        m1.insert("a".to_string(), Value::Int(1));
        let mut m2 = BTreeMap::new();
        m2.insert("a".to_string(), Value::Int(1));
        m2.insert("b".to_string(), Value::Int(2));
        assert_eq!(Value::Map(m1).canonical_encode(), Value::Map(m2).canonical_encode());
    }

    #[test]
    fn scalar_canonical_form_is_native_text() {
        assert_eq!(Value::Text("balu".to_string()).canonical_encode(), "balu");
        assert_eq!(Value::Int(30).canonical_encode(), "30");
        assert_eq!(Value::Bool(true).canonical_encode(), "true");
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            any::<String>().prop_map(Value::Text),
        ];
        leaf.prop_recursive(4, 32, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
                proptest::collection::btree_map(any::<String>(), inner, 0..8).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn json_round_trip_preserves_value(v in arb_value()) {
            prop_assert_eq!(Value::from_json(v.to_json()), v);
        }

        #[test]
        fn canonical_encode_is_order_independent_for_maps(pairs in proptest::collection::vec((any::<String>(), any::<i64>()), 0..8)) {
            let forward: BTreeMap<String, Value> = pairs.iter().cloned().map(|(k, i)| (k, Value::Int(i))).collect();
            let reversed: BTreeMap<String, Value> = pairs.into_iter().rev().map(|(k, i)| (k, Value::Int(i))).collect();
            prop_assert_eq!(Value::Map(forward).canonical_encode(), Value::Map(reversed).canonical_encode());
        }
    }
}
