//! Schema-aware statement builders.
//!
//! Every builder takes the live [`TableSchema`](crate::schema::TableSchema) of
//! its target table, quotes all identifiers and binds every data value to a
//! `?` placeholder. Field lists always follow schema order.
//!
//! ```ignore
//! use myorm::builder::{Select, InsertOptions, insert_one};
//!
//! let query = Select::new()
//!     .filter("status", vec!["new", "open"])
//!     .order_by("created_at", Some(Direction::Desc))
//!     .limit(20)
//!     .build(&schema)?;
//!
//! let query = insert_one(&schema, &entity, InsertOptions::upsert(), Dialect::Modern)?;
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::{Target, delete_many, delete_one};
pub use insert::{InsertOptions, insert_many, insert_one};
pub use select::Select;
pub use update::{update_many, update_one};

use crate::dialect::{Dialect, UPSERT_ALIAS};
use crate::ident::Ident;
use crate::sql::Sql;

/// Append the `ON DUPLICATE KEY UPDATE` clause for `fields`.
///
/// This is the only place the two upsert dialects diverge.
pub(crate) fn push_upsert_clause(sql: &mut Sql, dialect: Dialect, fields: &[Ident]) {
    let alias = Ident {
        parts: vec![UPSERT_ALIAS.to_string()],
    };

    if dialect == Dialect::Modern {
        sql.push(" AS ").push_ident_ref(&alias);
    }
    sql.push(" ON DUPLICATE KEY UPDATE ");

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_ident_ref(field).push(" = ");
        match dialect {
            Dialect::Modern => {
                sql.push_qualified(&alias, field);
            }
            Dialect::Legacy => {
                sql.push("VALUES(").push_ident_ref(field).push(")");
            }
        }
    }
}

#[cfg(test)]
mod tests;
