use super::degrade;
use crate::builder::{self, InsertOptions, Select};
use crate::client::GenericClient;
use crate::condition::{Conditions, Filter};
use crate::database::Database;
use crate::error::OrmResult;
use crate::filter::clean;
use crate::schema::TableSchema;
use crate::value::{Entity, Value};
use std::marker::PhantomData;

/// A value object stored in one table.
pub trait Model: Sized {
    /// Table name used by [`ModelRepository::new`].
    const TABLE: &'static str;

    /// Build the model from a cleaned row.
    fn from_entity(entity: Entity) -> OrmResult<Self>;

    /// All attributes to write, including the identifier when known.
    fn to_entity(&self) -> Entity;

    fn id(&self) -> Option<i64> {
        self.to_entity().id()
    }
}

/// Untyped rows. `TABLE` is empty, so use [`ModelRepository::for_table`].
impl Model for Entity {
    const TABLE: &'static str = "";

    fn from_entity(entity: Entity) -> OrmResult<Self> {
        Ok(entity)
    }

    fn to_entity(&self) -> Entity {
        self.clone()
    }

    fn id(&self) -> Option<i64> {
        Entity::id(self)
    }
}

/// Repository over the table of `M`.
///
/// Every operation describes the table once and builds its statements from
/// that snapshot.
pub struct ModelRepository<'a, M, C> {
    db: &'a Database<C>,
    table: String,
    _model: PhantomData<fn() -> M>,
}

impl<'a, M: Model, C: GenericClient> ModelRepository<'a, M, C> {
    pub fn new(db: &'a Database<C>) -> Self {
        Self::for_table(db, M::TABLE)
    }

    pub fn for_table(db: &'a Database<C>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            _model: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn database(&self) -> &'a Database<C> {
        self.db
    }

    async fn schema(&self) -> OrmResult<TableSchema> {
        self.db.describe(&self.table).await
    }

    async fn fetch_with(&self, schema: &TableSchema, select: Select) -> OrmResult<Vec<M>> {
        let rows = self.db.send(&select.build(schema)?).await?;
        rows.into_iter()
            .filter_map(|row| clean(row.into_entity(), schema))
            .map(M::from_entity)
            .collect()
    }

    async fn fetch(&self, select: Select) -> OrmResult<Vec<M>> {
        let schema = self.schema().await?;
        self.fetch_with(&schema, select).await
    }

    async fn fetch_one(&self, select: Select) -> OrmResult<Option<M>> {
        Ok(self.fetch(select.limit(1)).await?.into_iter().next())
    }

    async fn fetch_by_id(&self, id: i64) -> OrmResult<Option<M>> {
        let schema = self.schema().await?;
        let select = Select::new().filter(schema.id_field(), id).limit(1);
        Ok(self.fetch_with(&schema, select).await?.into_iter().next())
    }

    /// The row whose identifier equals `id`.
    pub async fn get_item_by_id(&self, id: i64) -> OrmResult<Option<M>> {
        let result = self.fetch_by_id(id).await;
        degrade(&self.table, "get_item_by_id", result)
    }

    /// The first row where `field` matches `value`.
    pub async fn get_item_by_field(
        &self,
        field: &str,
        value: impl Into<Filter>,
    ) -> OrmResult<Option<M>> {
        let result = self.fetch_one(Select::new().filter(field, value)).await;
        degrade(&self.table, "get_item_by_field", result)
    }

    /// The first row matching every condition.
    pub async fn get_item_by_fields(&self, conditions: Conditions) -> OrmResult<Option<M>> {
        let result = self.fetch_one(Select::new().conditions(conditions)).await;
        degrade(&self.table, "get_item_by_fields", result)
    }

    /// Rows matching `select`. Rows missing a required field are skipped.
    pub async fn get_item_list(&self, select: Select) -> OrmResult<Vec<M>> {
        let result = self.fetch(select).await;
        degrade(&self.table, "get_item_list", result)
    }

    pub async fn get_item_list_by_field(
        &self,
        field: &str,
        value: impl Into<Filter>,
    ) -> OrmResult<Vec<M>> {
        let result = self.fetch(Select::new().filter(field, value)).await;
        degrade(&self.table, "get_item_list_by_field", result)
    }

    /// Identifiers in table order, paged only when both bounds are given.
    pub async fn get_item_id_list(
        &self,
        offset: Option<u64>,
        amount: Option<u64>,
    ) -> OrmResult<Vec<i64>> {
        let result = self.db.id_list(&self.table, offset, amount).await;
        degrade(&self.table, "get_item_id_list", result)
    }

    pub async fn count(&self) -> OrmResult<u64> {
        let result = self.db.count(&self.table).await;
        degrade(&self.table, "count", result)
    }

    async fn build_items(&self, entities: Vec<Entity>, filter: bool) -> OrmResult<Option<Vec<M>>> {
        let schema = if filter { Some(self.schema().await?) } else { None };
        let mut models = Vec::with_capacity(entities.len());
        for entity in entities {
            let entity = match &schema {
                Some(schema) => clean(entity, schema),
                None => Some(entity),
            };
            match entity.filter(|e| !e.is_empty()) {
                Some(entity) => models.push(M::from_entity(entity)?),
                None => return Ok(None),
            }
        }
        Ok(Some(models))
    }

    /// Build a model without writing it.
    ///
    /// With `clean` set the attributes are filtered against the schema first,
    /// and a missing required field yields `None`. An empty attribute set
    /// always yields `None`.
    pub async fn create_item(&self, entity: Entity, clean: bool) -> OrmResult<Option<M>> {
        let result = self.build_items(vec![entity], clean).await;
        let item = degrade(&self.table, "create_item", result)?;
        Ok(item.and_then(|models| models.into_iter().next()))
    }

    /// [`create_item`](Self::create_item) for a list; `None` if any entity is rejected.
    pub async fn create_items(
        &self,
        entities: Vec<Entity>,
        clean: bool,
    ) -> OrmResult<Option<Vec<M>>> {
        let result = self.build_items(entities, clean).await;
        degrade(&self.table, "create_items", result)
    }

    async fn insert(&self, item: &M, upsert: bool) -> OrmResult<bool> {
        let schema = self.schema().await?;
        let Some(entity) = clean(item.to_entity(), &schema) else {
            return Ok(false);
        };
        let options = InsertOptions {
            ignore: false,
            upsert,
        };
        let query = builder::insert_one(&schema, &entity, options, self.db.dialect())?;
        self.db.execute(&query).await?;
        Ok(true)
    }

    /// Insert `item`, or upsert it when `upsert` is set.
    ///
    /// Returns `false` when a required field is missing or the write fails.
    pub async fn save(&self, item: &M, upsert: bool) -> OrmResult<bool> {
        let result = self.insert(item, upsert).await;
        degrade(&self.table, "save", result)
    }

    /// Insert every item in order, stopping at the first failure.
    pub async fn save_all(&self, items: &[M]) -> OrmResult<bool> {
        for item in items {
            if !self.save(item, false).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn write_update(&self, item: &M) -> OrmResult<bool> {
        let schema = self.schema().await?;
        let mut entity = item.to_entity();
        if entity.present(schema.id_field()).is_none() {
            return Ok(false);
        }
        entity.retain(|name, _| schema.contains(name));
        self.db.execute(&builder::update_one(&schema, &entity)?).await?;
        Ok(true)
    }

    /// Update the row identified by `item`'s identifier.
    ///
    /// Fields the model carries as null are written as NULL. Required
    /// fields are not checked here; the engine enforces NOT NULL.
    pub async fn update(&self, item: &M) -> OrmResult<bool> {
        let result = self.write_update(item).await;
        degrade(&self.table, "update", result)
    }

    /// Update every item in order, stopping at the first failure.
    pub async fn update_all(&self, items: &[M]) -> OrmResult<bool> {
        for item in items {
            if !self.update(item).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn delete(&self, id_of: impl FnOnce(&str) -> Option<i64>) -> OrmResult<bool> {
        let schema = self.schema().await?;
        let Some(id) = id_of(schema.id_field()) else {
            return Ok(false);
        };
        self.db.execute(&builder::delete_one(&schema, id)?).await?;
        Ok(true)
    }

    pub async fn remove_item_by_id(&self, id: i64) -> OrmResult<bool> {
        let result = self.delete(|_| Some(id)).await;
        degrade(&self.table, "remove_item_by_id", result)
    }

    /// Delete `item`'s row. A missing or non-numeric identifier yields `false`.
    pub async fn remove_item(&self, item: &M) -> OrmResult<bool> {
        let entity = item.to_entity();
        let result = self
            .delete(|field| entity.get(field).and_then(Value::as_i64))
            .await;
        degrade(&self.table, "remove_item", result)
    }
}
