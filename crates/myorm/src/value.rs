//! Scalar values and the entity attribute bag.
//!
//! [`Value`] is the only thing ever bound to a placeholder. [`Entity`] maps
//! field names to values and carries no schema knowledge: validity is decided
//! at write time against a [`TableSchema`](crate::schema::TableSchema).

use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The "empty-or-falsy" test used by select conditions.
    ///
    /// Null, `""`, `"0"`, `0` and `0.0` are falsy.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Int(n) => *n == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty() || s == "0",
        }
    }

    /// Interpret the value as an integer identifier.
    ///
    /// Text is accepted when it parses as an integer; floats only when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            Value::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = OrmError;

    fn try_from(json: serde_json::Value) -> OrmResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::from(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| OrmError::validation(format!("number out of range: {n}"))),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            other => Err(OrmError::validation(format!(
                "expected a scalar value, got {other}"
            ))),
        }
    }
}

/// Conversion from a [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(!other.is_falsy()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A plain attribute bag: field name to scalar value.
///
/// An entity need not cover every column. A field counts as *present* when its
/// key exists with a non-null value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(BTreeMap<String, Value>);

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Value stored under `name`, including explicit nulls.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Non-null value stored under `name`.
    pub fn present(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// True when `name` holds a non-falsy value.
    pub fn has(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|v| !v.is_falsy())
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Integer identifier stored under `id`, if numeric.
    pub fn id(&self) -> Option<i64> {
        self.id_in("id")
    }

    /// Integer identifier stored under a custom identifier field.
    pub fn id_in(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    /// Build an entity from a JSON object.
    pub fn from_json(json: serde_json::Value) -> OrmResult<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(OrmError::validation("entity JSON must be an object"));
        };
        map.into_iter()
            .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
            .collect::<OrmResult<BTreeMap<_, _>>>()
            .map(Self)
    }
}

impl From<BTreeMap<String, Value>> for Entity {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Entity {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Entity {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values() {
        assert!(Value::Null.is_falsy());
        assert!(Value::Int(0).is_falsy());
        assert!(Value::Float(0.0).is_falsy());
        assert!(Value::from("").is_falsy());
        assert!(Value::from("0").is_falsy());
        assert!(!Value::from("0.0").is_falsy());
        assert!(!Value::Int(-1).is_falsy());
    }

    #[test]
    fn id_accepts_numeric_text() {
        let entity = Entity::new().with("id", "42");
        assert_eq!(entity.id(), Some(42));
        assert_eq!(Entity::new().with("id", "abc").id(), None);
        assert_eq!(Entity::new().id(), None);
    }

    #[test]
    fn float_ids_must_fit_i64() {
        assert_eq!(Value::Float(7.0).as_i64(), Some(7));
        assert_eq!(Value::Float(-7.0).as_i64(), Some(-7));
        assert_eq!(Value::Float(7.5).as_i64(), None);
        assert_eq!(Value::Float(1e300).as_i64(), None);
        assert_eq!(Value::Float(-1e300).as_i64(), None);
        assert_eq!(Value::Float(9_223_372_036_854_775_808.0).as_i64(), None);
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn present_skips_nulls() {
        let entity = Entity::new().with("a", Value::Null).with("b", 1);
        assert!(entity.contains_key("a"));
        assert!(entity.present("a").is_none());
        assert_eq!(entity.present("b"), Some(&Value::Int(1)));
    }

    #[test]
    fn entity_from_json_object() {
        let entity = Entity::from_json(serde_json::json!({
            "name": "Ann",
            "age": 31,
            "score": 1.5,
            "note": null,
            "active": true,
        }))
        .unwrap();

        assert_eq!(entity.get("name"), Some(&Value::from("Ann")));
        assert_eq!(entity.get("age"), Some(&Value::Int(31)));
        assert_eq!(entity.get("score"), Some(&Value::Float(1.5)));
        assert_eq!(entity.get("note"), Some(&Value::Null));
        assert_eq!(entity.get("active"), Some(&Value::Int(1)));
    }

    #[test]
    fn entity_from_json_rejects_nested() {
        assert!(Entity::from_json(serde_json::json!({"tags": ["a"]})).is_err());
        assert!(Entity::from_json(serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn from_value_option() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::from("7")), Some(Some(7)));
        assert_eq!(i64::from_value(&Value::from("x")), None);
    }
}
