use super::degrade;
use super::model::Model;
use crate::client::GenericClient;
use crate::condition::{Conditions, Direction};
use crate::database::Database;
use crate::error::OrmResult;
use crate::filter::clean_joined;
use crate::join::JoinSpec;
use crate::schema::{SchemaCache, TableSchema};
use crate::value::{Entity, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Read-only repository over a [`JoinSpec`].
///
/// Rows are cleaned against the schemas of every selected table, restricted
/// to the selected fields, with aliases honoured.
pub struct JoinRepository<'a, M, C> {
    db: &'a Database<C>,
    spec: JoinSpec,
    params: BTreeMap<String, Value>,
    _model: PhantomData<fn() -> M>,
}

impl<'a, M: Model, C: GenericClient> JoinRepository<'a, M, C> {
    pub fn new(db: &'a Database<C>, spec: JoinSpec) -> Self {
        Self {
            db,
            spec,
            params: BTreeMap::new(),
            _model: PhantomData,
        }
    }

    pub fn spec(&self) -> &JoinSpec {
        &self.spec
    }

    /// Bind the value of a join predicate parameter.
    pub fn bind_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`bind_param`](Self::bind_param).
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind_param(name, value);
        self
    }

    async fn schemas(&self) -> OrmResult<Vec<TableSchema>> {
        let mut cache = SchemaCache::new(self.db.client());
        let mut schemas = Vec::with_capacity(self.spec.fields().len());
        for table in self.spec.fields() {
            let schema = cache.describe(&table.table).await?;
            schemas.push(table.restrict(schema)?);
        }
        Ok(schemas)
    }

    /// Per-table schemas, each restricted to the selected fields.
    pub async fn field_list(&self) -> OrmResult<Vec<TableSchema>> {
        let result = self.schemas().await;
        degrade(self.spec.table(), "field_list", result)
    }

    async fn fetch(
        &self,
        conditions: &Conditions,
        order: Option<(&str, Option<Direction>)>,
        limit: Option<u64>,
    ) -> OrmResult<Vec<M>> {
        let query = self.spec.build(conditions, order, limit, &self.params)?;
        let schemas = self.schemas().await?;
        let rows = self.db.send(&query).await?;
        rows.into_iter()
            .filter_map(|row| clean_joined(row.into_entity(), &self.spec, &schemas))
            .map(M::from_entity)
            .collect()
    }

    /// The joined row whose primary-table identifier equals `id`.
    pub async fn get_item_by_id(&self, id: i64) -> OrmResult<Option<M>> {
        let conditions = Conditions::new().and(self.spec.key_field(), vec![id]);
        let result = self.fetch(&conditions, None, Some(1)).await;
        Ok(degrade(self.spec.table(), "get_item_by_id", result)?
            .into_iter()
            .next())
    }

    /// Joined rows filtered by IN-lists on primary-table columns.
    ///
    /// The order column is emitted unqualified, so it may name an alias.
    pub async fn get_item_list(
        &self,
        conditions: Conditions,
        order: Option<(&str, Option<Direction>)>,
        limit: Option<u64>,
    ) -> OrmResult<Vec<M>> {
        let result = self.fetch(&conditions, order, limit).await;
        degrade(self.spec.table(), "get_item_list", result)
    }

    /// Build a model from a joined attribute set without reading anything
    /// but the schemas.
    pub async fn create_item(&self, entity: Entity) -> OrmResult<Option<M>> {
        let result = async {
            let schemas = self.schemas().await?;
            clean_joined(entity, &self.spec, &schemas)
                .filter(|e| !e.is_empty())
                .map(M::from_entity)
                .transpose()
        };
        degrade(self.spec.table(), "create_item", result.await)
    }
}
