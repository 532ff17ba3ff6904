//! Pooled MySQL/MariaDB client (via `mysql_async`).

use crate::client::{GenericClient, WriteOutcome};
use crate::config::ClientConfig;
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::monitor::{InstrumentedClient, LoggingMonitor, MonitorConfig, QueryType, TracingSqlHook};
use crate::row::Row;
use crate::value::Value;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts};

/// The database handle returned by [`Database::connect`].
pub type MySqlDatabase = Database<InstrumentedClient<MySqlClient>>;

/// A [`GenericClient`] over a `mysql_async` connection pool.
///
/// Every call checks out one connection and returns it to the pool when the
/// call ends, whatever the outcome. Reconnecting dropped connections is left
/// to the pool.
#[derive(Debug, Clone)]
pub struct MySqlClient {
    pool: Pool,
}

impl MySqlClient {
    /// Build a pool from `config`. No connection is opened until first use.
    pub fn connect(config: &ClientConfig) -> OrmResult<Self> {
        config.validate()?;
        let opts = Opts::from_url(&config.url).map_err(|e| OrmError::Connection(e.to_string()))?;
        let constraints = PoolConstraints::new(config.pool_min, config.pool_max).ok_or_else(|| {
            OrmError::configuration(format!(
                "invalid pool bounds {}..={}",
                config.pool_min, config.pool_max
            ))
        })?;
        let opts = OptsBuilder::from_opts(opts)
            .pool_opts(PoolOpts::default().with_constraints(constraints));
        Ok(Self::from_pool(Pool::new(opts)))
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn disconnect(self) -> OrmResult<()> {
        self.pool.disconnect().await.map_err(OrmError::from)
    }

    async fn conn(&self) -> OrmResult<Conn> {
        self.pool
            .get_conn()
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))
    }
}

impl GenericClient for MySqlClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let mut conn = self.conn().await?;
        // DESCRIBE and SHOW go over the text protocol.
        let rows: Vec<mysql_async::Row> =
            if params.is_empty() && QueryType::from_sql(sql) == QueryType::Other {
                conn.query(sql).await?
            } else {
                conn.exec(sql, positional(params)).await?
            };
        Ok(rows.into_iter().map(convert_row).collect())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<WriteOutcome> {
        let mut conn = self.conn().await?;
        conn.exec_drop(sql, positional(params)).await?;
        Ok(WriteOutcome {
            rows_affected: conn.affected_rows(),
            last_insert_id: conn.last_insert_id().filter(|id| *id != 0),
        })
    }
}

impl Database<InstrumentedClient<MySqlClient>> {
    /// Open a pool, wrap it with SQL logging and pick the upsert dialect.
    ///
    /// The dialect comes from `config.dialect` when set, otherwise from
    /// `SELECT VERSION()`.
    pub async fn connect(config: &ClientConfig) -> OrmResult<Self> {
        let mut monitor_config = MonitorConfig::new();
        if let Some(timeout) = config.query_timeout {
            monitor_config = monitor_config.with_query_timeout(timeout);
        }
        if let Some(threshold) = config.slow_query_threshold {
            monitor_config = monitor_config
                .with_slow_query_threshold(threshold)
                .enable_monitoring();
        }

        let hook = match config.max_sql_length {
            Some(len) => TracingSqlHook::new().max_sql_length(len),
            None => TracingSqlHook::new().no_truncate(),
        };
        let monitor = LoggingMonitor {
            max_sql_length: config.max_sql_length,
            ..LoggingMonitor::default()
        };

        let client = InstrumentedClient::new(MySqlClient::connect(config)?)
            .with_config(monitor_config)
            .with_hook(hook)
            .with_monitor(monitor);

        match config.dialect {
            Some(dialect) => Ok(Database::new(client, dialect)),
            None => Database::detect(client).await,
        }
    }
}

fn positional(params: &[Value]) -> Params {
    if params.is_empty() {
        Params::Empty
    } else {
        Params::Positional(params.iter().cloned().map(mysql_async::Value::from).collect())
    }
}

fn convert_row(mut row: mysql_async::Row) -> Row {
    let columns = row.columns();
    let values = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = row
                .take::<mysql_async::Value, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null);
            (column.name_str().into_owned(), value)
        })
        .collect();
    Row::new(values)
}

impl From<Value> for mysql_async::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => mysql_async::Value::NULL,
            Value::Int(n) => mysql_async::Value::Int(n),
            Value::Float(f) => mysql_async::Value::Double(f),
            Value::Text(s) => mysql_async::Value::Bytes(s.into_bytes()),
        }
    }
}

impl From<mysql_async::Value> for Value {
    fn from(value: mysql_async::Value) -> Self {
        use mysql_async::Value as My;
        match value {
            My::NULL => Value::Null,
            My::Bytes(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
            My::Int(n) => Value::Int(n),
            My::UInt(n) => match i64::try_from(n) {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Text(n.to_string()),
            },
            My::Float(f) => Value::Float(f64::from(f)),
            My::Double(f) => Value::Float(f),
            My::Date(year, month, day, hour, minute, second, micros) => {
                let mut text = format!("{year:04}-{month:02}-{day:02}");
                if (hour, minute, second, micros) != (0, 0, 0, 0) {
                    text.push_str(&format!(" {hour:02}:{minute:02}:{second:02}"));
                }
                if micros != 0 {
                    text.push_str(&format!(".{micros:06}"));
                }
                Value::Text(text)
            }
            My::Time(negative, days, hours, minutes, seconds, micros) => {
                let sign = if negative { "-" } else { "" };
                let hours = u32::from(hours) + days * 24;
                let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
                if micros != 0 {
                    text.push_str(&format!(".{micros:06}"));
                }
                Value::Text(text)
            }
        }
    }
}
