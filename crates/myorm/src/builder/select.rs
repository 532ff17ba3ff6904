//! Single-table SELECT builder.

use crate::condition::{Conditions, Direction, Filter};
use crate::error::OrmResult;
use crate::ident::Ident;
use crate::schema::TableSchema;
use crate::sql::{Query, Sql};

/// `SELECT * FROM table [WHERE ...] [ORDER BY ...] [LIMIT n]`.
///
/// Condition and order columns that are not in the schema are dropped
/// silently, so stray keys in caller-supplied maps never reach the engine.
/// A limit of 1 marks a single-row read (see [`Select::is_single_row`]).
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct Select {
    conditions: Conditions,
    order: Option<(String, Option<Direction>)>,
    limit: Option<u64>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND another condition.
    pub fn filter(mut self, column: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.conditions.insert(column, filter);
        self
    }

    /// Replace all conditions.
    pub fn conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Option<Direction>) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit_opt(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// True when the caller asked for one row (or none).
    pub fn is_single_row(&self) -> bool {
        self.limit == Some(1)
    }

    pub fn build(&self, schema: &TableSchema) -> OrmResult<Query> {
        let mut sql = Sql::new("SELECT * FROM ");
        sql.push_ident_ref(&schema.ident()?);

        let mut first = true;
        for (column, filter) in self.conditions.iter() {
            if !schema.contains(column) {
                tracing::debug!(
                    target: "myorm.sql",
                    table = schema.table(),
                    column,
                    "dropping condition on unknown column"
                );
                continue;
            }

            sql.push(if first { " WHERE " } else { " AND " });
            first = false;
            sql.push_ident_ref(&Ident::quoted(column)?);

            if filter.is_null_test() {
                sql.push(" IS NULL");
                continue;
            }
            match filter {
                Filter::NotNull => {
                    sql.push(" IS NOT NULL");
                }
                Filter::In(values) => {
                    sql.push(" IN (");
                    sql.push_bind_list(values.iter().cloned());
                    sql.push(")");
                }
                Filter::Eq(value) => {
                    sql.push(" = ");
                    sql.push_bind(value.clone());
                }
            }
        }

        if let Some((column, direction)) = &self.order {
            if schema.contains(column) {
                sql.push(" ORDER BY ");
                sql.push_ident_ref(&Ident::quoted(column)?);
                if let Some(direction) = direction {
                    sql.push(" ");
                    sql.push(direction.as_sql());
                }
            } else {
                tracing::debug!(
                    target: "myorm.sql",
                    table = schema.table(),
                    column = column.as_str(),
                    "dropping ORDER BY on unknown column"
                );
            }
        }

        if let Some(limit) = self.limit {
            sql.push(&format!(" LIMIT {limit}"));
        }

        Ok(sql.build())
    }
}
