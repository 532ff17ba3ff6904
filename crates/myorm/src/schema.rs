//! Live table schema introspection.
//!
//! Schemas are value snapshots: [`describe`] always asks the engine, and a
//! [`SchemaCache`] only memoizes lookups for the duration of one logical
//! operation, since the schema may change between calls.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::row::Row;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Index role reported in the `Key` column of `DESCRIBE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    None,
    /// `PRI`
    Primary,
    /// `UNI`
    Unique,
    /// `MUL`: first column of a non-unique index, which is how foreign keys show up
    Foreign,
}

impl KeyRole {
    fn from_describe(key: &str) -> Self {
        match key {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Foreign,
            _ => Self::None,
        }
    }
}

/// Schema metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub key: KeyRole,
    pub default: Option<String>,
    pub extra: String,
}

impl FieldDescriptor {
    /// Shorthand used by tests and fixtures.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
            key: KeyRole::None,
            default: None,
            extra: String::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn key(mut self, key: KeyRole) -> Self {
        self.key = key;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn is_primary(&self) -> bool {
        self.key == KeyRole::Primary
    }

    /// Generated columns cannot be written.
    pub fn is_generated(&self) -> bool {
        self.extra.to_ascii_uppercase().contains("GENERATED")
    }

    /// A field every insert must supply: NOT NULL, no default, not the primary key.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none() && !self.is_primary() && !self.is_generated()
    }

    /// Parse one `DESCRIBE` row (`Field`, `Type`, `Null`, `Key`, `Default`, `Extra`).
    pub fn from_describe_row(row: &Row) -> OrmResult<Self> {
        let text = |column: &str| -> OrmResult<String> {
            match row.get(column) {
                Some(Value::Null) | None => Ok(String::new()),
                Some(v) => Ok(v.to_string()),
            }
        };

        let name = row.try_get::<String>("Field")?;
        let default = match row.get("Default") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.to_string()),
        };

        Ok(Self {
            name,
            data_type: text("Type")?,
            nullable: text("Null")?.eq_ignore_ascii_case("YES"),
            key: KeyRole::from_describe(&text("Key")?),
            default,
            extra: text("Extra")?,
        })
    }
}

/// Ordered field descriptors for one table. Field names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    table: String,
    fields: Vec<FieldDescriptor>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, fields: Vec<FieldDescriptor>) -> OrmResult<Self> {
        let table = table.into();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(OrmError::validation(format!(
                    "duplicate field '{}' in schema of '{table}'",
                    field.name
                )));
            }
        }
        Ok(Self { table, fields })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// The identifier column: the single primary key, or `id` when the table has
    /// none or a composite one.
    pub fn id_field(&self) -> &str {
        let mut primaries = self.fields.iter().filter(|f| f.is_primary());
        match (primaries.next(), primaries.next()) {
            (Some(only), None) => &only.name,
            _ => "id",
        }
    }

    pub(crate) fn ident(&self) -> OrmResult<Ident> {
        Ident::parse(&self.table)
    }
}

/// Fetch a table's schema from the engine.
///
/// Fails with [`OrmError::Query`] when the table does not exist and
/// [`OrmError::Connection`] when the engine is unreachable. No retry.
pub async fn describe<C: GenericClient>(client: &C, table: &str) -> OrmResult<TableSchema> {
    let ident = Ident::parse(table)?;
    let sql = format!("DESCRIBE {}", ident.to_sql());
    let rows = client.query(&sql, &[]).await?;
    if rows.is_empty() {
        return Err(OrmError::Query(format!("Table '{table}' doesn't exist")));
    }
    let fields = rows
        .iter()
        .map(FieldDescriptor::from_describe_row)
        .collect::<OrmResult<Vec<_>>>()?;
    TableSchema::new(table, fields)
}

/// Per-operation memo of table schemas.
///
/// Borrow it for one logical operation (e.g. clean + insert, or a multi-table
/// join) and drop it afterwards.
pub struct SchemaCache<'c, C> {
    client: &'c C,
    tables: HashMap<String, TableSchema>,
}

impl<'c, C: GenericClient> SchemaCache<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            tables: HashMap::new(),
        }
    }

    /// Describe `table`, hitting the engine only on the first call.
    pub async fn describe(&mut self, table: &str) -> OrmResult<&TableSchema> {
        match self.tables.entry(table.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let schema = describe(self.client, table).await?;
                Ok(e.insert(schema))
            }
        }
    }

    /// Schemas fetched so far.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
