use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// A monitor that reports completed statements as `tracing` events.
///
/// Completions go out at `debug`, slow statements at `warn`, both on the
/// `myorm.sql` target.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    /// Only report statements at least this slow.
    pub min_duration: Option<Duration>,
    /// Truncate long SQL strings (in bytes).
    pub max_sql_length: Option<usize>,
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self {
            min_duration: None,
            max_sql_length: Some(200),
        }
    }
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryMonitor for LoggingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if self.min_duration.is_some_and(|min| duration < min) {
            return;
        }
        let sql = self.truncate_sql(&ctx.sql);
        tracing::debug!(
            target: "myorm.sql",
            query_type = ?ctx.query_type,
            table = ctx.table.as_deref().unwrap_or("-"),
            ?duration,
            result = %result,
            sql = %sql,
            "statement complete"
        );
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        let sql = self.truncate_sql(&ctx.sql);
        tracing::warn!(
            target: "myorm.sql",
            query_type = ?ctx.query_type,
            ?duration,
            sql = %sql,
            "slow query"
        );
    }
}

/// Running totals collected by [`StatsMonitor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    /// `INSERT`, `UPDATE` and `DELETE` statements
    pub write_queries: u64,
    pub failed_queries: u64,
    pub slow_queries: u64,
    pub rows_read: u64,
    pub rows_affected: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
}

/// Accumulates [`QueryStats`] across every statement it observes.
///
/// Useful for checking how many round trips a queue flush cost.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    stats: Mutex<QueryStats>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn totals(&self) -> MutexGuard<'_, QueryStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> QueryStats {
        self.totals().clone()
    }

    pub fn reset(&self) {
        *self.totals() = QueryStats::default();
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let mut totals = self.totals();
        totals.total_queries += 1;
        if ctx.query_type.is_write() {
            totals.write_queries += 1;
        }
        match result {
            QueryResult::Rows(n) => totals.rows_read += *n as u64,
            QueryResult::Affected(n) => totals.rows_affected += n,
            QueryResult::Error(_) => totals.failed_queries += 1,
        }
        totals.total_duration = totals.total_duration.saturating_add(duration);
        totals.max_duration = totals.max_duration.max(duration);
    }

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {
        self.totals().slow_queries += 1;
    }
}

/// Runs several hooks in order; the first abort wins.
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        for hook in &self.hooks {
            if let action @ HookAction::Abort(_) = hook.before_query(ctx) {
                return action;
            }
        }
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for hook in &self.hooks {
            hook.after_query(ctx, duration, result);
        }
    }
}
