//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::{Entity, FromValue, Value};

/// One result-set row: column names and values in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw value of a column, by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Raw value of a column, by position.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.columns.get(idx).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Get a column value by name, returning an `OrmError::Decode` on failure.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "no such column"))?;
        T::from_value(value).ok_or_else(|| {
            OrmError::decode(
                column,
                format!("cannot convert {value:?} to {}", std::any::type_name::<T>()),
            )
        })
    }

    /// Turn the row into an attribute bag keyed by column name.
    pub fn into_entity(self) -> Entity {
        self.columns.into_iter().collect()
    }
}

/// Trait for types that can be constructed from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

impl FromRow for Entity {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone().into_entity())
    }
}
