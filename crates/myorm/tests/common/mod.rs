//! In-memory client shared by the integration tests.

#![allow(dead_code)]

use myorm::{GenericClient, OrmError, OrmResult, Row, Value, WriteOutcome};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A recorded statement and its parameters.
pub type Statement = (String, Vec<Value>);

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    results: VecDeque<Vec<Row>>,
    log: Vec<Statement>,
    version: String,
    writes_before_failure: Option<usize>,
}

/// Records every statement, serves canned `DESCRIBE` rows and queued result
/// sets, and can be told to fail writes.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.state().version = "8.0.36".to_string();
        client
    }

    /// `users`: `id` (auto-increment key), `name` (required), `email`
    /// (nullable) and `status` (defaults to `new`).
    pub fn with_users() -> Self {
        Self::new().table(
            "users",
            vec![
                describe_row("id", "int", "NO", "PRI", None, "auto_increment"),
                describe_row("name", "varchar(64)", "NO", "", None, ""),
                describe_row("email", "varchar(128)", "YES", "", None, ""),
                describe_row("status", "varchar(16)", "NO", "", Some("new"), ""),
            ],
        )
    }

    pub fn table(self, name: &str, rows: Vec<Row>) -> Self {
        self.state().tables.insert(name.to_string(), rows);
        self
    }

    pub fn version(self, version: &str) -> Self {
        self.state().version = version.to_string();
        self
    }

    /// Queue a result set for the next non-DESCRIBE query.
    pub fn push_result(&self, rows: Vec<Row>) {
        self.state().results.push_back(rows);
    }

    /// Let `count` more writes succeed, then fail every write.
    pub fn fail_writes_after(&self, count: usize) {
        self.state().writes_before_failure = Some(count);
    }

    pub fn heal(&self) {
        self.state().writes_before_failure = None;
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state().log.clone()
    }

    /// Statements other than `DESCRIBE` and `SELECT`.
    pub fn writes(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|(sql, _)| !sql.starts_with("DESCRIBE") && !sql.starts_with("SELECT"))
            .collect()
    }

    pub fn selects(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|(sql, _)| sql.starts_with("SELECT"))
            .collect()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let mut state = self.state();
        state.log.push((sql.to_string(), params.to_vec()));

        if let Some(table) = sql.strip_prefix("DESCRIBE ") {
            let table = table.trim_matches('`');
            return Ok(state.tables.get(table).cloned().unwrap_or_default());
        }
        if sql.starts_with("SELECT VERSION()") {
            let version = Value::from(state.version.clone());
            return Ok(vec![Row::new(vec![("version".to_string(), version)])]);
        }
        Ok(state.results.pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<WriteOutcome> {
        let mut state = self.state();
        state.log.push((sql.to_string(), params.to_vec()));

        if let Some(remaining) = state.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(OrmError::Statement("Deadlock found (1213)".to_string()));
            }
            *remaining -= 1;
        }
        Ok(WriteOutcome {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

/// One row of `DESCRIBE` output.
pub fn describe_row(
    field: &str,
    data_type: &str,
    null: &str,
    key: &str,
    default: Option<&str>,
    extra: &str,
) -> Row {
    Row::new(vec![
        ("Field".to_string(), Value::from(field)),
        ("Type".to_string(), Value::from(data_type)),
        ("Null".to_string(), Value::from(null)),
        ("Key".to_string(), Value::from(key)),
        ("Default".to_string(), Value::from(default)),
        ("Extra".to_string(), Value::from(extra)),
    ])
}

/// A result row from `(column, value)` pairs.
pub fn row<const N: usize>(columns: [(&str, Value); N]) -> Row {
    Row::new(
        columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

/// Number of `?` placeholders in `sql`.
pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}
