use std::fmt;
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// `DESCRIBE`, `SHOW` and anything else
    Other,
}

impl QueryType {
    /// Classify a statement by its leading keyword, skipping whitespace,
    /// comments and opening parentheses.
    pub fn from_sql(sql: &str) -> Self {
        let head = leading_keyword(sql);
        if head.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if head.eq_ignore_ascii_case("INSERT") || head.eq_ignore_ascii_case("REPLACE") {
            QueryType::Insert
        } else if head.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if head.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }

    pub fn is_write(self) -> bool {
        matches!(self, QueryType::Insert | QueryType::Update | QueryType::Delete)
    }
}

/// Skip leading whitespace, `--`/`#` line comments, `/* */` blocks and `(`.
fn skip_prefix(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        let rest = if s.starts_with("--") || s.starts_with('#') {
            s.find('\n').map_or("", |pos| &s[pos + 1..])
        } else if let Some(body) = s.strip_prefix("/*") {
            body.find("*/").map_or("", |pos| &body[pos + 2..])
        } else if let Some(rest) = s.strip_prefix('(') {
            rest
        } else {
            return s;
        };
        s = rest;
    }
}

fn leading_keyword(sql: &str) -> &str {
    let s = skip_prefix(sql);
    let end = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    &s[..end]
}

/// The table a statement writes to, reads from or describes.
///
/// Only the first table is reported; joins are not followed. Returns `None`
/// when no table can be found.
pub fn target_table(sql: &str) -> Option<String> {
    let s = skip_prefix(sql);
    let upper = s.to_ascii_uppercase();
    let marker = match QueryType::from_sql(s) {
        QueryType::Select | QueryType::Delete => " FROM ",
        QueryType::Insert => " INTO ",
        QueryType::Update => "UPDATE ",
        QueryType::Other if upper.starts_with("DESCRIBE ") => "DESCRIBE ",
        QueryType::Other => return None,
    };
    let rest = s[upper.find(marker)? + marker.len()..].trim_start();
    let name = match rest.strip_prefix('`') {
        Some(quoted) => &quoted[..quoted.find('`')?],
        None => rest
            .split(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .next()?,
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// What the hooks and monitors know about one statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub sql: String,
    pub param_count: usize,
    pub query_type: QueryType,
    /// First table named by the statement, see [`target_table`].
    pub table: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, param_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            param_count,
            query_type: QueryType::from_sql(sql),
            table: target_table(sql),
        }
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, for monitoring purposes.
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// Query returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
            Self::Error(format!("{truncated}..."))
        } else {
            Self::Error(msg)
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Observer of statement execution.
pub trait QueryMonitor: Send + Sync {
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes, successfully or not.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a statement exceeds the slow-query threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// What to do after a hook has seen a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    /// Refuse to run the statement.
    Abort(String),
}

/// Hook into the statement lifecycle.
pub trait QueryHook: Send + Sync {
    /// Called before a statement is executed.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after a statement completes, before monitors see it.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
