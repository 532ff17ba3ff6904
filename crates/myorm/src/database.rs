//! Executor: schema lookup, statement building and execution in one call.

use crate::builder::{self, InsertOptions, Select, Target};
use crate::client::{GenericClient, WriteOutcome};
use crate::dialect::{Dialect, ServerVersion};
use crate::error::OrmResult;
use crate::ident::Ident;
use crate::row::Row;
use crate::schema::{self, TableSchema};
use crate::sql::{Query, Sql};
use crate::value::{Entity, Value};

/// A client bound to an upsert dialect.
///
/// Every table operation describes the table first, so statements are always
/// built against the live schema. Engine failures propagate unchanged.
#[derive(Debug, Clone)]
pub struct Database<C> {
    client: C,
    dialect: Dialect,
}

impl<C: GenericClient> Database<C> {
    pub fn new(client: C, dialect: Dialect) -> Self {
        Self { client, dialect }
    }

    /// Wrap `client`, picking the dialect from `SELECT VERSION()`.
    pub async fn detect(client: C) -> OrmResult<Self> {
        let version = client.server_version().await?;
        let dialect = Dialect::for_server(&ServerVersion::parse(&version)?);
        tracing::debug!(target: "myorm.sql", version = %version, %dialect, "detected server dialect");
        Ok(Self::new(client, dialect))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub async fn describe(&self, table: &str) -> OrmResult<TableSchema> {
        schema::describe(&self.client, table).await
    }

    /// Run a query and return its rows.
    pub async fn send(&self, query: &Query) -> OrmResult<Vec<Row>> {
        tracing::debug!(
            target: "myorm.sql",
            sql = query.sql(),
            param_count = query.params().len(),
            "query"
        );
        self.client.query(query.sql(), query.params()).await
    }

    /// Run a statement and report affected rows.
    pub async fn execute(&self, query: &Query) -> OrmResult<WriteOutcome> {
        tracing::debug!(
            target: "myorm.sql",
            sql = query.sql(),
            param_count = query.params().len(),
            "execute"
        );
        self.client.execute(query.sql(), query.params()).await
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> OrmResult<u64> {
        let mut sql = Sql::new("SELECT COUNT(*) AS `count` FROM ");
        sql.push_ident(table)?;
        let rows = self.send(&sql.build()).await?;
        match rows.first() {
            Some(row) => Ok(u64::try_from(row.try_get::<i64>("count")?).unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// All rows matching `select`.
    pub async fn select(&self, table: &str, select: &Select) -> OrmResult<Vec<Row>> {
        let schema = self.describe(table).await?;
        self.send(&select.build(&schema)?).await
    }

    /// The first row matching `select`; the limit is forced to 1.
    pub async fn select_one(&self, table: &str, select: Select) -> OrmResult<Option<Row>> {
        let rows = self.select(table, &select.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn insert_one(
        &self,
        table: &str,
        entity: &Entity,
        options: InsertOptions,
    ) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        let query = builder::insert_one(&schema, entity, options, self.dialect)?;
        self.execute(&query).await
    }

    pub async fn insert_many(
        &self,
        table: &str,
        entities: &[Entity],
        options: InsertOptions,
    ) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        let query = builder::insert_many(&schema, entities, options, self.dialect)?;
        self.execute(&query).await
    }

    pub async fn update_one(&self, table: &str, entity: &Entity) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        self.execute(&builder::update_one(&schema, entity)?).await
    }

    pub async fn update_many(&self, table: &str, entities: &[Entity]) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        self.execute(&builder::update_many(&schema, entities)?).await
    }

    pub async fn remove_one(&self, table: &str, id: impl Into<Value>) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        self.execute(&builder::delete_one(&schema, id)?).await
    }

    pub async fn remove_many(&self, table: &str, targets: &[Target]) -> OrmResult<WriteOutcome> {
        let schema = self.describe(table).await?;
        self.execute(&builder::delete_many(&schema, targets)?).await
    }

    /// Identifiers of `table`, optionally paged with `LIMIT offset, amount`.
    ///
    /// Paging applies only when both bounds are given. Non-numeric
    /// identifiers are skipped.
    pub async fn id_list(
        &self,
        table: &str,
        offset: Option<u64>,
        amount: Option<u64>,
    ) -> OrmResult<Vec<i64>> {
        let schema = self.describe(table).await?;
        let id = Ident::quoted(schema.id_field())?;

        let mut sql = Sql::new("SELECT ");
        sql.push_ident_ref(&id).push(" FROM ");
        sql.push_ident(table)?;
        if let (Some(offset), Some(amount)) = (offset, amount) {
            sql.push(&format!(" LIMIT {offset}, {amount}"));
        }

        let rows = self.send(&sql.build()).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get_index(0).and_then(Value::as_i64))
            .collect())
    }
}
