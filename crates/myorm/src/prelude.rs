//! Convenient imports for typical `myorm` usage.
//!
//! ```ignore
//! use myorm::prelude::*;
//! ```

pub use crate::{
    ClientConfig, Conditions, Database, Direction, Entity, Filter, FromRow, GenericClient,
    InsertOptions, Join, JoinRepository, JoinSpec, Model, ModelRepository, OrmError, OrmResult,
    Row, Select, Target, Value, WriteKind, WriteQueue,
};

#[cfg(feature = "mysql")]
pub use crate::{MySqlClient, MySqlDatabase};
