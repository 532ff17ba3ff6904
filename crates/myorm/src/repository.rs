//! Typed read/write access to one table, or to a joined read.
//!
//! Repositories sit on top of [`Database`](crate::Database) and absorb engine
//! failures: a failed read yields `None` or an empty list, a failed write
//! yields `false`, and a `warn!` on the `myorm.repo` target records why.
//! [`OrmError::Configuration`] is the exception and always propagates.
//!
//! ```ignore
//! struct User { id: Option<i64>, name: String }
//!
//! impl Model for User {
//!     const TABLE: &'static str = "users";
//!     fn from_entity(entity: Entity) -> OrmResult<Self> { ... }
//!     fn to_entity(&self) -> Entity { ... }
//! }
//!
//! let users = ModelRepository::<User, _>::new(&db);
//! if let Some(mut ann) = users.get_item_by_field("name", "Ann").await? {
//!     ann.name = "Anne".into();
//!     users.update(&ann).await?;
//! }
//! ```

mod join;
mod model;

pub use join::JoinRepository;
pub use model::{Model, ModelRepository};

use crate::error::{OrmError, OrmResult};

/// Replace a failed result with `T::default()`, unless it is a configuration error.
pub(crate) fn degrade<T: Default>(
    table: &str,
    operation: &'static str,
    result: OrmResult<T>,
) -> OrmResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ OrmError::Configuration(_)) => Err(e),
        Err(e) => {
            tracing::warn!(target: "myorm.repo", table, operation, error = %e, "operation failed");
            Ok(T::default())
        }
    }
}
