//! Generic client trait for unified database access.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub rows_affected: u64,
    /// Auto-increment value generated by an INSERT, if any.
    pub last_insert_id: Option<u64>,
}

/// The statement-execution seam between the builders and a SQL engine.
///
/// Implementations own connection acquisition: each call runs on one
/// connection, and statements are never issued concurrently on the same one.
/// Parameters bind positionally to the `?` placeholders in `sql`.
pub trait GenericClient: Send + Sync {
    /// Execute a statement and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and report affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<WriteOutcome>> + Send;

    /// Execute a statement and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// The engine's version string, as returned by `SELECT VERSION()`.
    fn server_version(&self) -> impl std::future::Future<Output = OrmResult<String>> + Send {
        async move {
            let row = self.query_opt("SELECT VERSION() AS `version`", &[]).await?;
            match row {
                Some(row) => row.try_get::<String>("version"),
                None => Ok(String::new()),
            }
        }
    }
}

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<WriteOutcome>> + Send {
        (**self).execute(sql, params)
    }

    fn server_version(&self) -> impl std::future::Future<Output = OrmResult<String>> + Send {
        (**self).server_version()
    }
}

impl<C: GenericClient> GenericClient for std::sync::Arc<C> {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<WriteOutcome>> + Send {
        (**self).execute(sql, params)
    }

    fn server_version(&self) -> impl std::future::Future<Output = OrmResult<String>> + Send {
        (**self).server_version()
    }
}
