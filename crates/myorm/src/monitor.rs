//! Query monitoring and hooks for SQL execution.
//!
//! This module provides:
//! - [`QueryHook`]s that inspect or abort a statement before it runs
//! - [`QueryMonitor`]s that observe durations and outcomes
//! - [`InstrumentedClient`], which wraps any [`GenericClient`](crate::GenericClient)
//!   with both, plus an optional timeout and slow-query threshold
//!
//! # Example
//!
//! ```rust,ignore
//! use myorm::monitor::{InstrumentedClient, MonitorConfig, StatsMonitor, TracingSqlHook};
//! use std::time::Duration;
//!
//! let client = InstrumentedClient::new(pool_client)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(250))
//!             .enable_monitoring(),
//!     )
//!     .with_hook(TracingSqlHook::new())
//!     .with_monitor(StatsMonitor::new());
//! ```

mod config;
mod instrumented;
mod monitors;
mod tracing_hook;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use monitors::{CompositeHook, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use tracing_hook::TracingSqlHook;
pub use types::{
    HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType, target_table,
};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
