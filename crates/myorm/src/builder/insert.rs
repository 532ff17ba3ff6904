//! INSERT builders, with optional `IGNORE` and upsert.

use super::push_upsert_clause;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::schema::{FieldDescriptor, TableSchema};
use crate::sql::{Query, Sql};
use crate::value::Entity;

/// Duplicate-key handling for inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// `INSERT IGNORE`
    pub ignore: bool,
    /// Append `ON DUPLICATE KEY UPDATE`
    pub upsert: bool,
}

impl InsertOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn ignore() -> Self {
        Self {
            ignore: true,
            upsert: false,
        }
    }

    pub fn upsert() -> Self {
        Self {
            ignore: false,
            upsert: true,
        }
    }

    fn head(self) -> &'static str {
        if self.ignore {
            "INSERT IGNORE INTO "
        } else {
            "INSERT INTO "
        }
    }
}

fn writable(schema: &TableSchema) -> impl Iterator<Item = &FieldDescriptor> {
    schema.fields().iter().filter(|f| !f.is_generated())
}

fn push_column_list(sql: &mut Sql, columns: &[Ident]) {
    sql.push(" (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_ident_ref(column);
    }
    sql.push(")");
}

/// Insert one entity.
///
/// Columns are the schema fields the entity holds a non-null value for, in
/// schema order. With `upsert`, every inserted column is refreshed on a
/// duplicate key.
pub fn insert_one(
    schema: &TableSchema,
    entity: &Entity,
    options: InsertOptions,
    dialect: Dialect,
) -> OrmResult<Query> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for field in writable(schema) {
        if let Some(value) = entity.present(&field.name) {
            columns.push(Ident::quoted(&field.name)?);
            values.push(value.clone());
        }
    }

    if columns.is_empty() {
        return Err(OrmError::validation(format!(
            "insert into '{}': entity has no known fields",
            schema.table()
        )));
    }

    let mut sql = Sql::new(options.head());
    sql.push_ident_ref(&schema.ident()?);
    push_column_list(&mut sql, &columns);
    sql.push(" VALUES (");
    sql.push_bind_list(values);
    sql.push(")");

    if options.upsert {
        push_upsert_clause(&mut sql, dialect, &columns);
    }

    Ok(sql.build())
}

/// Insert a batch of entities in one multi-row statement.
///
/// The column list is every schema field that at least one entity mentions.
/// Per row, a non-null value binds a placeholder, an explicit null renders
/// `NULL` and a missing key renders `DEFAULT`. With `upsert`, only fields that
/// were populated with a non-null value somewhere in the batch are updated.
pub fn insert_many(
    schema: &TableSchema,
    entities: &[Entity],
    options: InsertOptions,
    dialect: Dialect,
) -> OrmResult<Query> {
    if entities.is_empty() {
        return Err(OrmError::validation(format!(
            "insert into '{}': empty batch",
            schema.table()
        )));
    }

    let fields: Vec<&FieldDescriptor> = writable(schema)
        .filter(|f| entities.iter().any(|e| e.contains_key(&f.name)))
        .collect();
    if fields.is_empty() {
        return Err(OrmError::validation(format!(
            "insert into '{}': no entity has a known field",
            schema.table()
        )));
    }

    // Computed once per batch; read-only while rendering.
    let populated: Vec<bool> = fields
        .iter()
        .map(|f| entities.iter().any(|e| e.present(&f.name).is_some()))
        .collect();

    let columns = fields
        .iter()
        .map(|f| Ident::quoted(&f.name))
        .collect::<OrmResult<Vec<_>>>()?;

    let mut sql = Sql::new(options.head());
    sql.push_ident_ref(&schema.ident()?);
    push_column_list(&mut sql, &columns);
    sql.push(" VALUES ");

    for (row, entity) in entities.iter().enumerate() {
        if row > 0 {
            sql.push(", ");
        }
        sql.push("(");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            match entity.get(&field.name) {
                Some(value) if !value.is_null() => {
                    sql.push_bind(value.clone());
                }
                Some(_) => {
                    sql.push("NULL");
                }
                None => {
                    sql.push("DEFAULT");
                }
            }
        }
        sql.push(")");
    }

    if options.upsert {
        let updated: Vec<Ident> = columns
            .iter()
            .zip(&populated)
            .filter(|(_, populated)| **populated)
            .map(|(column, _)| column.clone())
            .collect();

        if updated.is_empty() {
            tracing::debug!(
                target: "myorm.sql",
                table = schema.table(),
                "batch populates no field; skipping ON DUPLICATE KEY UPDATE"
            );
        } else {
            push_upsert_clause(&mut sql, dialect, &updated);
        }
    }

    Ok(sql.build())
}
