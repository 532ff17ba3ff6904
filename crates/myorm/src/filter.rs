//! Reconcile input attribute maps with the live schema.
//!
//! Rejection is not an error: both functions return `None` when a required
//! field is missing and leave it to the caller to skip or abort.

use crate::join::JoinSpec;
use crate::schema::TableSchema;
use crate::value::Entity;

/// Drop keys unknown to `schema`, then require every required field.
///
/// A field is required when it is NOT NULL, has no default and is not the
/// primary key (see [`FieldDescriptor::is_required`]). It counts as supplied
/// only with a non-null value.
///
/// [`FieldDescriptor::is_required`]: crate::schema::FieldDescriptor::is_required
pub fn clean(mut entity: Entity, schema: &TableSchema) -> Option<Entity> {
    entity.retain(|name, _| schema.contains(name));

    let missing = schema
        .required_fields()
        .find(|f| entity.present(&f.name).is_none());
    if let Some(field) = missing {
        tracing::debug!(
            target: "myorm.sql",
            table = schema.table(),
            field = field.name.as_str(),
            "rejecting entity without required field"
        );
        return None;
    }

    Some(entity)
}

/// [`clean`] for rows of a joined read.
///
/// `schemas` are the per-table schemas restricted to the selected fields (see
/// [`TableFields::restrict`](crate::join::TableFields::restrict)). A key is kept
/// when it names a selected column or its alias in any table. Required fields
/// are looked up under their output name and only need to be present as keys,
/// since an outer join may legitimately produce nulls.
pub fn clean_joined(mut entity: Entity, spec: &JoinSpec, schemas: &[TableSchema]) -> Option<Entity> {
    entity.retain(|name, _| {
        schemas.iter().any(|schema| {
            schema.contains(name)
                || spec
                    .table_fields(schema.table())
                    .is_some_and(|t| t.mentions(name))
        })
    });

    for schema in schemas {
        let selected = spec.table_fields(schema.table());
        for field in schema.required_fields() {
            let name = selected
                .and_then(|t| t.output_name(&field.name))
                .unwrap_or(field.name.as_str());
            if !entity.contains_key(name) {
                tracing::debug!(
                    target: "myorm.sql",
                    table = schema.table(),
                    field = name,
                    "rejecting joined row without required field"
                );
                return None;
            }
        }
    }

    Some(entity)
}
