//! Select conditions.
//!
//! Conditions are AND-combined equality, IN-list and NULL tests. There is no
//! general expression tree.

use crate::value::Value;
use std::collections::BTreeMap;

/// The literal sentinel that renders `IS NOT NULL` instead of binding a value.
pub const IS_NOT_NULL: &str = "IS NOT NULL";

/// A condition on one column.
///
/// Rendering rules:
/// - a falsy scalar (null, `""`, `"0"`, `0`, `0.0`) or an empty list: `IS NULL`
/// - a non-empty list: `IN (?, ...)`
/// - [`Filter::NotNull`] (or the text `"IS NOT NULL"`): `IS NOT NULL`
/// - any other scalar: `= ?`
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Value),
    In(Vec<Value>),
    NotNull,
}

impl Filter {
    pub fn eq(value: impl Into<Value>) -> Self {
        Filter::from(value.into())
    }

    pub fn in_list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Filter::In(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null() -> Self {
        Filter::Eq(Value::Null)
    }

    pub fn not_null() -> Self {
        Filter::NotNull
    }

    /// True when this filter renders as `IS NULL`.
    pub fn is_null_test(&self) -> bool {
        match self {
            Filter::Eq(v) => v.is_falsy(),
            Filter::In(values) => values.is_empty(),
            Filter::NotNull => false,
        }
    }

    /// All values this filter compares against, as an IN-list.
    pub(crate) fn into_list(self) -> Vec<Value> {
        match self {
            Filter::Eq(v) => vec![v],
            Filter::In(values) => values,
            Filter::NotNull => Vec::new(),
        }
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(ref s) if s == IS_NOT_NULL => Filter::NotNull,
            other => Filter::Eq(other),
        }
    }
}

impl From<i64> for Filter {
    fn from(v: i64) -> Self {
        Filter::Eq(Value::Int(v))
    }
}

impl From<i32> for Filter {
    fn from(v: i32) -> Self {
        Filter::Eq(Value::from(v))
    }
}

impl From<f64> for Filter {
    fn from(v: f64) -> Self {
        Filter::Eq(Value::Float(v))
    }
}

impl From<&str> for Filter {
    fn from(v: &str) -> Self {
        Filter::from(Value::from(v))
    }
}

impl From<String> for Filter {
    fn from(v: String) -> Self {
        Filter::from(Value::Text(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Filter {
    fn from(values: Vec<T>) -> Self {
        Filter::in_list(values)
    }
}

/// Ordered, AND-combined conditions keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(Vec<(String, Filter)>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the condition on `column`.
    pub fn and(mut self, column: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.insert(column, filter);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, filter: impl Into<Filter>) {
        let column = column.into();
        let filter = filter.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = filter,
            None => self.0.push((column, filter)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.0.iter().map(|(c, f)| (c.as_str(), f))
    }
}

impl IntoIterator for Conditions {
    type Item = (String, Filter);
    type IntoIter = std::vec::IntoIter<(String, Filter)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, F: Into<Filter>> FromIterator<(K, F)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (k, f) in iter {
            conditions.insert(k, f);
        }
        conditions
    }
}

impl From<BTreeMap<String, Value>> for Conditions {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    /// Parse `ASC`/`DESC`; anything else means "engine default".
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_text_becomes_not_null() {
        assert_eq!(Filter::from("IS NOT NULL"), Filter::NotNull);
        assert_eq!(Filter::from("is not null"), Filter::Eq(Value::from("is not null")));
    }

    #[test]
    fn null_tests() {
        assert!(Filter::from(Vec::<i64>::new()).is_null_test());
        assert!(Filter::from("").is_null_test());
        assert!(Filter::from(0).is_null_test());
        assert!(!Filter::from(vec![0]).is_null_test());
        assert!(!Filter::NotNull.is_null_test());
    }

    #[test]
    fn later_condition_replaces_earlier() {
        let conditions = Conditions::new().and("status", "new").and("status", "done");
        assert_eq!(conditions.len(), 1);
        assert_eq!(
            conditions.iter().next(),
            Some(("status", &Filter::Eq(Value::from("done"))))
        );
    }

    #[test]
    fn direction_is_case_sensitive() {
        assert_eq!(Direction::parse("DESC"), Some(Direction::Desc));
        assert_eq!(Direction::parse("desc"), None);
    }
}
