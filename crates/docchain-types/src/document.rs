use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::property::ValueType;

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A document tree in the JSON data model.
///
/// Numbers are always `f64`. [`Document::Hole`] marks a sequence slot that no
/// property filled in during reconstruction; it never comes out of JSON
/// decoding and produces no leaf when flattened.
#[derive(Clone, Debug)]
pub enum Document {
    Null,
    String(String),
    Bool(bool),
    Float(f64),
    Map(BTreeMap<String, Document>),
    Sequence(Vec<Document>),
    Hole,
}

impl Document {
    /// The leaf type tag, or `None` for containers and holes.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => Some(ValueType::Nil),
            Self::String(_) => Some(ValueType::String),
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Float(_) => Some(ValueType::Float64),
            Self::Map(_) | Self::Sequence(_) | Self::Hole => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.value_type().is_some()
    }

    /// Look up a direct child by map key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Holes become `null`. Floats without a fractional part that fit the
    /// exact-integer range are emitted as JSON integers.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Hole => Value::Null,
            Self::String(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Float(f) => float_to_json(*f),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Sequence(items) => Value::Array(items.iter().map(Document::to_json).collect()),
        }
    }
}

fn float_to_json(f: f64) -> Value {
    let integral = f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER && !(f == 0.0 && f.is_sign_negative());
    if integral {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Floats compare by bit pattern, matching their canonical binary encoding.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Hole, Self::Hole) => true,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Document {}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            // Every JSON number is finite, so `as_f64` always succeeds.
            Value::Number(n) => Self::Float(n.as_f64().unwrap_or_default()),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Document::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Document::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Document {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_maps_every_kind() {
        let doc = Document::from(json!({"n": null, "s": "x", "b": true, "f": 1.5, "a": [1, {"k": false}]}));
        assert_eq!(doc.get("n"), Some(&Document::Null));
        assert_eq!(doc.get("s"), Some(&Document::from("x")));
        assert_eq!(doc.get("b"), Some(&Document::Bool(true)));
        assert_eq!(doc.get("f"), Some(&Document::Float(1.5)));
        assert_eq!(
            doc.get("a"),
            Some(&Document::Sequence(vec![
                Document::Float(1.0),
                Document::Map(BTreeMap::from([("k".to_string(), Document::Bool(false))])),
            ]))
        );
    }

    #[test]
    fn integral_floats_encode_as_integers() {
        let doc = Document::from(json!({"a": "x", "b": [1, 2, 3]}));
        assert_eq!(
            serde_json::to_string(&doc.to_json()).unwrap(),
            r#"{"a":"x","b":[1,2,3]}"#
        );
    }

    #[test]
    fn fractional_and_huge_floats_stay_floats() {
        assert_eq!(Document::Float(0.25).to_json(), json!(0.25));
        assert_eq!(Document::Float(1e300).to_json(), json!(1e300));
        assert_eq!(Document::Float(-0.0).to_json().as_f64().unwrap().to_bits(), (-0.0f64).to_bits());
    }

    #[test]
    fn holes_encode_as_null() {
        let doc = Document::Sequence(vec![Document::Hole, Document::from("x")]);
        assert_eq!(doc.to_json(), json!([null, "x"]));
    }

    #[test]
    fn equality_distinguishes_hole_from_null() {
        assert_ne!(Document::Hole, Document::Null);
        assert_ne!(Document::Float(0.0), Document::Float(-0.0));
        assert_eq!(Document::Float(2.0), Document::Float(2.0));
    }

    #[test]
    fn value_type_for_leaves_only() {
        assert_eq!(Document::Null.value_type(), Some(ValueType::Nil));
        assert_eq!(Document::Float(1.0).value_type(), Some(ValueType::Float64));
        assert!(Document::Sequence(vec![]).value_type().is_none());
        assert!(!Document::Hole.is_scalar());
    }
}
