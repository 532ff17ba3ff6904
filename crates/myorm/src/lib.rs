//! # myorm
//!
//! A schema-aware MySQL/MariaDB access layer.
//!
//! ## Features
//!
//! - **Schema-checked statements**: every builder works from a live `DESCRIBE`,
//!   drops unknown fields and quotes every identifier
//! - **Placeholders only**: data values are always bound, never interpolated
//! - **Version-aware upserts**: alias-based `ON DUPLICATE KEY UPDATE` on MySQL
//!   8.0.19+, `VALUES(col)` on older servers and MariaDB
//! - **Batch writes**: multi-row INSERT, `CASE`-based multi-row UPDATE and
//!   IN-list DELETE
//! - **Write-behind queue**: buffer entities per table and flush in chunks
//! - **Joined reads**: declarative multi-table SELECT with aliases
//! - **Query monitoring**: hooks, timing, slow-query warnings and timeouts
//!
//! ## Example
//!
//! ```ignore
//! use myorm::prelude::*;
//!
//! let db = MySqlDatabase::connect(&ClientConfig::from_env()?).await?;
//!
//! let rows = db
//!     .select("users", &Select::new().filter("status", vec!["new", "open"]).limit(10))
//!     .await?;
//!
//! db.insert_one("users", &Entity::new().with("name", "Ann"), InsertOptions::upsert())
//!     .await?;
//!
//! let mut queue = WriteQueue::new(&db);
//! queue.add_to_queue("users", WriteKind::Insert, Entity::new().with("name", "Bob")).await?;
//! queue.flush_all().await?;
//! ```

pub mod builder;
pub mod client;
pub mod condition;
pub mod config;
pub mod database;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod ident;
pub mod join;
pub mod monitor;
pub mod queue;
pub mod repository;
pub mod row;
pub mod schema;
pub mod sql;
pub mod value;

pub mod prelude;

pub use builder::{InsertOptions, Select, Target};
pub use client::{GenericClient, WriteOutcome};
pub use condition::{Conditions, Direction, Filter, IS_NOT_NULL};
pub use config::ClientConfig;
pub use database::Database;
pub use dialect::{Dialect, ServerVersion};
pub use error::{OrmError, OrmResult};
pub use filter::{clean, clean_joined};
pub use ident::{Ident, IntoIdent};
pub use join::{Join, JoinKind, JoinSpec};
pub use monitor::{
    CompositeHook, HookAction, InstrumentedClient, LoggingMonitor, MonitorConfig,
    NoopMonitor, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryStats, QueryType,
    StatsMonitor, TracingSqlHook,
};
pub use queue::{WriteKind, WriteQueue};
pub use repository::{JoinRepository, Model, ModelRepository};
pub use row::{FromRow, Row};
pub use schema::{FieldDescriptor, KeyRole, SchemaCache, TableSchema};
pub use sql::{Query, Sql, sql};
pub use value::{Entity, FromValue, Value};

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlClient, MySqlDatabase};
