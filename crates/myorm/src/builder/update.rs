//! UPDATE builders.

use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::schema::TableSchema;
use crate::sql::{Query, Sql};
use crate::value::{Entity, Value};

/// Update one row by identifier.
///
/// Every schema field the entity mentions (other than the identifier) is set,
/// including explicit nulls. Fails with [`OrmError::Validation`] when the
/// entity carries no identifier or nothing to set.
pub fn update_one(schema: &TableSchema, entity: &Entity) -> OrmResult<Query> {
    let id_field = schema.id_field();
    let Some(id) = entity.present(id_field) else {
        return Err(OrmError::validation(format!(
            "update of '{}': entity has no '{id_field}'",
            schema.table()
        )));
    };

    let mut sql = Sql::new("UPDATE ");
    sql.push_ident_ref(&schema.ident()?);
    sql.push(" SET ");

    let mut set = 0;
    for field in schema.fields() {
        if field.name == id_field || field.is_generated() {
            continue;
        }
        let Some(value) = entity.get(&field.name) else {
            continue;
        };
        if set > 0 {
            sql.push(", ");
        }
        sql.push_ident_ref(&Ident::quoted(&field.name)?);
        sql.push(" = ");
        sql.push_bind(value.clone());
        set += 1;
    }

    if set == 0 {
        return Err(OrmError::validation(format!(
            "update of '{}': entity has no updatable field",
            schema.table()
        )));
    }

    sql.push(" WHERE ");
    sql.push_ident_ref(&Ident::quoted(id_field)?);
    sql.push(" = ");
    sql.push_bind(id.clone());
    sql.push(" LIMIT 1");

    Ok(sql.build())
}

/// Update many rows in one statement using one CASE expression per field.
///
/// ```text
/// UPDATE `t` SET `f` = CASE WHEN `id` = ? THEN ? ... ELSE `f` END, ...
/// WHERE `id` IN (?, ...)
/// ```
///
/// A field gets a CASE only if at least one entity supplies it; rows that do
/// not supply it fall through to `ELSE f`, i.e. stay unchanged. Entities
/// without an identifier are skipped.
pub fn update_many(schema: &TableSchema, entities: &[Entity]) -> OrmResult<Query> {
    let id_field = schema.id_field();
    let id_ident = Ident::quoted(id_field)?;

    let keyed: Vec<(&Value, &Entity)> = entities
        .iter()
        .filter_map(|e| e.present(id_field).map(|id| (id, e)))
        .collect();
    if keyed.len() < entities.len() {
        tracing::debug!(
            target: "myorm.sql",
            table = schema.table(),
            skipped = entities.len() - keyed.len(),
            "skipping entities without identifier in batch update"
        );
    }

    let mut sql = Sql::new("UPDATE ");
    sql.push_ident_ref(&schema.ident()?);
    sql.push(" SET ");

    let mut cases = 0;
    for field in schema.fields() {
        if field.name == id_field || field.is_generated() {
            continue;
        }
        let arms: Vec<(&Value, &Value)> = keyed
            .iter()
            .filter_map(|(id, e)| e.get(&field.name).map(|v| (*id, v)))
            .collect();
        if arms.is_empty() {
            continue;
        }

        let column = Ident::quoted(&field.name)?;
        if cases > 0 {
            sql.push(", ");
        }
        sql.push_ident_ref(&column);
        sql.push(" = CASE");
        for (id, value) in arms {
            sql.push(" WHEN ");
            sql.push_ident_ref(&id_ident);
            sql.push(" = ");
            sql.push_bind(id.clone());
            sql.push(" THEN ");
            sql.push_bind(value.clone());
        }
        sql.push(" ELSE ");
        sql.push_ident_ref(&column);
        sql.push(" END");
        cases += 1;
    }

    if cases == 0 {
        return Err(OrmError::validation(format!(
            "batch update of '{}': no entity supplies an updatable field",
            schema.table()
        )));
    }

    sql.push(" WHERE ");
    sql.push_ident_ref(&id_ident);
    sql.push(" IN (");
    sql.push_bind_list(keyed.iter().map(|(id, _)| (*id).clone()));
    sql.push(")");

    Ok(sql.build())
}
