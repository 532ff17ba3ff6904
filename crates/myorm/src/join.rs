//! Multi-table SELECT from a declarative join specification.
//!
//! A [`JoinSpec`] names the primary table, the fields selected from each table
//! (optionally aliased) and the joined tables with their ON predicates.
//! Predicates either reference another table's column or a named parameter
//! bound at execution time.
//!
//! ```ignore
//! let spec = JoinSpec::new("orders")
//!     .select("orders", ["id", "total"])
//!     .select_as("users", "name", "customer")
//!     .join(
//!         Join::left("users")
//!             .on_column("id", "orders", "user_id")
//!             .on_param("active", "active"),
//!     );
//!
//! let params = BTreeMap::from([("active".to_string(), Value::Int(1))]);
//! let query = spec.build(&Conditions::new().and("id", vec![1, 2]), None, None, &params)?;
//! // SELECT `orders`.`id`, `orders`.`total`, `users`.`name` AS `customer` FROM `orders`
//! //   LEFT JOIN `users` ON `users`.`id` = `orders`.`user_id` AND `users`.`active` = ?
//! //   WHERE `orders`.`id` IN (?, ?)
//! ```

use crate::condition::{Conditions, Direction, Filter};
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::schema::TableSchema;
use crate::sql::{Query, Sql};
use crate::value::Value;
use std::collections::BTreeMap;

/// Join type. Joins are always emitted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// Right-hand side of a join predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOn {
    /// `joined.field = table.column`
    Column { table: String, column: String },
    /// `joined.field = ?`, filled from the named parameter.
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPredicate {
    pub field: String,
    pub on: JoinOn,
}

/// One joined table and its AND-combined predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub predicates: Vec<JoinPredicate>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            predicates: Vec::new(),
        }
    }

    pub fn inner(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, table)
    }

    pub fn left(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, table)
    }

    pub fn right(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, table)
    }

    pub fn full(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Full, table)
    }

    /// `this.field = table.column`
    pub fn on_column(
        mut self,
        field: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.predicates.push(JoinPredicate {
            field: field.into(),
            on: JoinOn::Column {
                table: table.into(),
                column: column.into(),
            },
        });
        self
    }

    /// `this.field = ?` bound from the parameter `param`.
    pub fn on_param(mut self, field: impl Into<String>, param: impl Into<String>) -> Self {
        self.predicates.push(JoinPredicate {
            field: field.into(),
            on: JoinOn::Param(param.into()),
        });
        self
    }
}

/// A selected column and its optional output alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectField {
    pub field: String,
    pub alias: Option<String>,
}

impl SelectField {
    /// Name of this field in result rows.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }
}

/// The fields selected from one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFields {
    pub table: String,
    pub fields: Vec<SelectField>,
}

impl TableFields {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// True when `name` is a selected column or an alias of one.
    pub fn mentions(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.field == name || f.alias.as_deref() == Some(name))
    }

    /// Output name for column `field`, if it is selected.
    pub fn output_name(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(SelectField::output_name)
    }

    /// Keep only the descriptors of selected columns, in schema order.
    pub fn restrict(&self, schema: &TableSchema) -> OrmResult<TableSchema> {
        let fields = schema
            .fields()
            .iter()
            .filter(|d| self.fields.iter().any(|f| f.field == d.name))
            .cloned()
            .collect();
        TableSchema::new(schema.table(), fields)
    }
}

/// Declarative description of a joined read.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct JoinSpec {
    table: String,
    key: String,
    fields: Vec<TableFields>,
    joins: Vec<Join>,
}

impl JoinSpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: "id".to_string(),
            fields: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Identifier column of the primary table (default `id`).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Select columns of `table` under their own names.
    pub fn select<I, S>(mut self, table: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.table_entry(table);
        entry.fields.extend(fields.into_iter().map(|f| SelectField {
            field: f.into(),
            alias: None,
        }));
        self
    }

    /// Select one column of `table` as `alias`.
    pub fn select_as(
        mut self,
        table: &str,
        field: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        let entry = self.table_entry(table);
        entry.fields.push(SelectField {
            field: field.into(),
            alias: Some(alias.into()),
        });
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    fn table_entry(&mut self, table: &str) -> &mut TableFields {
        let pos = match self.fields.iter().position(|t| t.table == table) {
            Some(pos) => pos,
            None => {
                self.fields.push(TableFields::new(table));
                self.fields.len() - 1
            }
        };
        &mut self.fields[pos]
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_field(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &[TableFields] {
        &self.fields
    }

    pub fn table_fields(&self, table: &str) -> Option<&TableFields> {
        self.fields.iter().find(|t| t.table == table)
    }

    /// Joins in emission order: inner, left, right, full, declaration order within a kind.
    pub fn ordered_joins(&self) -> Vec<&Join> {
        let mut joins: Vec<&Join> = self.joins.iter().collect();
        joins.sort_by_key(|j| j.kind);
        joins
    }

    /// Names of the join parameters, in the order their placeholders appear.
    pub fn param_names(&self) -> Vec<&str> {
        self.ordered_joins()
            .into_iter()
            .flat_map(|j| j.predicates.iter())
            .filter_map(|p| match &p.on {
                JoinOn::Param(name) => Some(name.as_str()),
                JoinOn::Column { .. } => None,
            })
            .collect()
    }

    /// Render the joined SELECT.
    ///
    /// Every condition on the primary table becomes an IN-list, scalars
    /// included. Join parameters are taken from `params` and bound before the
    /// WHERE values; a parameter missing from `params` is an error.
    pub fn build(
        &self,
        conditions: &Conditions,
        order: Option<(&str, Option<Direction>)>,
        limit: Option<u64>,
        params: &BTreeMap<String, Value>,
    ) -> OrmResult<Query> {
        let main = Ident::parse(&self.table)?;

        let mut sql = Sql::new("SELECT ");
        let mut count = 0;
        for table in &self.fields {
            let table_ident = Ident::parse(&table.table)?;
            for field in &table.fields {
                if count > 0 {
                    sql.push(", ");
                }
                sql.push_qualified(&table_ident, &Ident::quoted(&field.field)?);
                if let Some(alias) = &field.alias {
                    sql.push(" AS ").push_ident_ref(&Ident::quoted(alias)?);
                }
                count += 1;
            }
        }
        if count == 0 {
            return Err(OrmError::validation(format!(
                "join on '{}' selects no fields",
                self.table
            )));
        }

        sql.push(" FROM ").push_ident_ref(&main);

        for join in self.ordered_joins() {
            let joined = Ident::parse(&join.table)?;
            sql.push(" ")
                .push(join.kind.as_sql())
                .push(" ")
                .push_ident_ref(&joined);
            for (i, predicate) in join.predicates.iter().enumerate() {
                sql.push(if i == 0 { " ON " } else { " AND " });
                sql.push_qualified(&joined, &Ident::quoted(&predicate.field)?);
                sql.push(" = ");
                match &predicate.on {
                    JoinOn::Column { table, column } => {
                        sql.push_qualified(&Ident::parse(table)?, &Ident::quoted(column)?);
                    }
                    JoinOn::Param(name) => {
                        let Some(value) = params.get(name) else {
                            return Err(OrmError::validation(format!(
                                "join parameter '{name}' is not bound"
                            )));
                        };
                        sql.push_bind(value.clone());
                    }
                }
            }
        }

        for (i, (column, filter)) in conditions.iter().enumerate() {
            if *filter == Filter::NotNull {
                return Err(OrmError::validation(format!(
                    "joined read on '{column}': only IN-list filters are supported, not IS NOT NULL"
                )));
            }
            sql.push(if i == 0 { " WHERE " } else { " AND " });
            sql.push_qualified(&main, &Ident::quoted(column)?);
            sql.push(" IN (");
            sql.push_bind_list(filter.clone().into_list());
            sql.push(")");
        }

        if let Some((column, direction)) = order {
            sql.push(" ORDER BY ").push_ident_ref(&Ident::quoted(column)?);
            if let Some(direction) = direction {
                sql.push(" ").push(direction.as_sql());
            }
        }

        if let Some(limit) = limit {
            sql.push(&format!(" LIMIT {limit}"));
        }

        Ok(sql.build())
    }
}
