//! DELETE builders.

use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::schema::TableSchema;
use crate::sql::{Query, Sql};
use crate::value::{Entity, Value};

/// A row to delete: a bare identifier or an entity carrying one.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Id(Value),
    Entity(Entity),
}

impl Target {
    fn id<'a>(&'a self, id_field: &str) -> Option<&'a Value> {
        match self {
            Target::Id(v) if !v.is_null() => Some(v),
            Target::Id(_) => None,
            Target::Entity(e) => e.present(id_field),
        }
    }
}

impl From<i64> for Target {
    fn from(id: i64) -> Self {
        Target::Id(Value::Int(id))
    }
}

impl From<Value> for Target {
    fn from(id: Value) -> Self {
        Target::Id(id)
    }
}

impl From<Entity> for Target {
    fn from(entity: Entity) -> Self {
        Target::Entity(entity)
    }
}

/// `DELETE FROM t WHERE id = ? LIMIT 1`
pub fn delete_one(schema: &TableSchema, id: impl Into<Value>) -> OrmResult<Query> {
    let id = id.into();
    if id.is_null() {
        return Err(OrmError::validation(format!(
            "delete from '{}': null identifier",
            schema.table()
        )));
    }

    let mut sql = Sql::new("DELETE FROM ");
    sql.push_ident_ref(&schema.ident()?);
    sql.push(" WHERE ");
    sql.push_ident_ref(&Ident::quoted(schema.id_field())?);
    sql.push(" = ");
    sql.push_bind(id);
    sql.push(" LIMIT 1");
    Ok(sql.build())
}

/// `DELETE FROM t WHERE id IN (?, ...)`
///
/// Targets without an identifier are skipped; if none remain this fails
/// rather than emitting an empty IN-list.
pub fn delete_many(schema: &TableSchema, targets: &[Target]) -> OrmResult<Query> {
    let id_field = schema.id_field();
    let ids: Vec<Value> = targets
        .iter()
        .filter_map(|t| t.id(id_field).cloned())
        .collect();

    if ids.is_empty() {
        return Err(OrmError::validation(format!(
            "batch delete from '{}': no identifiers",
            schema.table()
        )));
    }

    let mut sql = Sql::new("DELETE FROM ");
    sql.push_ident_ref(&schema.ident()?);
    sql.push(" WHERE ");
    sql.push_ident_ref(&Ident::quoted(id_field)?);
    sql.push(" IN (");
    sql.push_bind_list(ids);
    sql.push(")");
    Ok(sql.build())
}
