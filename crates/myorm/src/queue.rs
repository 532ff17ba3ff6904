//! Write-behind queue.
//!
//! Entities accumulate per `(table, kind)` until the threshold is reached,
//! then drain through the batch builders in chunks of at most `threshold`
//! entities and at most [`MAX_PLACEHOLDERS`] bound values. The automatic flush
//! runs inside [`WriteQueue::add_to_queue`], so producers wait for it once a
//! key fills up.
//!
//! A key whose flush failed is stalled: it keeps accumulating but is no longer
//! flushed automatically. Only [`WriteQueue::flush_queue`] or
//! [`WriteQueue::flush_all`] write it again.
//!
//! ```ignore
//! let mut queue = WriteQueue::new(&db);
//! for user in users {
//!     queue.add_to_queue("users", WriteKind::Insert, user).await?;
//! }
//! queue.flush_all().await?;
//! ```

use crate::builder::{InsertOptions, Target};
use crate::client::GenericClient;
use crate::config::{ClientConfig, DEFAULT_BATCH_SIZE};
use crate::database::Database;
use crate::error::{OrmError, OrmResult};
use crate::value::Entity;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Most `?` placeholders MySQL accepts in one prepared statement.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// The batch write a queued entity is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WriteKind {
    /// `INSERT ... ON DUPLICATE KEY UPDATE` through [`Database::insert_many`]
    Insert,
    /// `UPDATE ... CASE` through [`Database::update_many`]
    Update,
    /// `DELETE ... IN` through [`Database::remove_many`]
    Remove,
}

impl WriteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteKind::Insert => "insert",
            WriteKind::Update => "update",
            WriteKind::Remove => "remove",
        }
    }

    /// Upper bound on the placeholders `entity` adds to this kind's batch
    /// statement.
    fn placeholders(self, entity: &Entity) -> usize {
        match self {
            // explicit nulls render as a NULL literal
            WriteKind::Insert => entity.iter().filter(|(_, v)| !v.is_null()).count(),
            // a WHEN/THEN pair per field plus the id in the IN-list
            WriteKind::Update => 2 * entity.len() + 1,
            WriteKind::Remove => 1,
        }
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteKind {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s {
            "insert" => Ok(WriteKind::Insert),
            "update" => Ok(WriteKind::Update),
            "remove" => Ok(WriteKind::Remove),
            other => Err(OrmError::configuration(format!(
                "no batch write for queue kind '{other}'"
            ))),
        }
    }
}

/// Buffers entities per table and kind, writing them in batches.
///
/// The queue is single-writer: concurrent producers must serialize access
/// themselves (a mutex or a channel in front of it).
pub struct WriteQueue<'a, C> {
    db: &'a Database<C>,
    threshold: usize,
    entries: BTreeMap<String, BTreeMap<WriteKind, Vec<Entity>>>,
    stalled: BTreeSet<(String, WriteKind)>,
}

impl<'a, C: GenericClient> WriteQueue<'a, C> {
    pub fn new(db: &'a Database<C>) -> Self {
        Self {
            db,
            threshold: DEFAULT_BATCH_SIZE,
            entries: BTreeMap::new(),
            stalled: BTreeSet::new(),
        }
    }

    /// A queue using `config.batch_size` as its threshold.
    pub fn from_config(db: &'a Database<C>, config: &ClientConfig) -> Self {
        Self::new(db).with_threshold(config.batch_size)
    }

    /// Set the flush threshold; values below 1 are raised to 1.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Total number of queued entities.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entities waiting under `(table, kind)`.
    pub fn pending(&self, table: &str, kind: WriteKind) -> usize {
        self.entries
            .get(table)
            .and_then(|kinds| kinds.get(&kind))
            .map_or(0, Vec::len)
    }

    /// True when the last flush of `(table, kind)` failed and no explicit
    /// flush has succeeded since.
    pub fn is_stalled(&self, table: &str, kind: WriteKind) -> bool {
        self.stalled.contains(&(table.to_string(), kind))
    }

    /// Append `entity` and flush its key once the threshold is reached.
    ///
    /// The entity is queued even when this returns `Err`: the error comes from
    /// the automatic flush, whose entities stay queued and whose key is then
    /// stalled. Do not add the entity again.
    pub async fn add_to_queue(
        &mut self,
        table: &str,
        kind: WriteKind,
        entity: Entity,
    ) -> OrmResult<()> {
        let queued = self
            .entries
            .entry(table.to_string())
            .or_default()
            .entry(kind)
            .or_default();
        queued.push(entity);
        let size = queued.len();

        if size >= self.threshold && !self.is_stalled(table, kind) {
            tracing::debug!(target: "myorm.queue", table, %kind, size, "threshold reached");
            self.flush_kind(table, kind).await?;
        }
        Ok(())
    }

    /// Write out the entities queued for `table`.
    ///
    /// With `kind` set only that key drains; otherwise every kind of the table
    /// drains in `insert`, `update`, `remove` order. Flushing an empty key
    /// does nothing.
    ///
    /// If a chunk fails, it and every chunk after it stay queued, the key is
    /// stalled and the error is returned. Chunks already written are not
    /// queued again. A successful flush clears the stall.
    pub async fn flush_queue(&mut self, table: &str, kind: Option<WriteKind>) -> OrmResult<()> {
        match kind {
            Some(kind) => self.flush_kind(table, kind).await,
            None => {
                let kinds: Vec<WriteKind> = match self.entries.get(table) {
                    Some(kinds) => kinds.keys().copied().collect(),
                    None => return Ok(()),
                };
                for kind in kinds {
                    self.flush_kind(table, kind).await?;
                }
                self.entries.remove(table);
                Ok(())
            }
        }
    }

    /// Flush every table.
    pub async fn flush_all(&mut self) -> OrmResult<()> {
        let tables: Vec<String> = self.entries.keys().cloned().collect();
        for table in tables {
            self.flush_queue(&table, None).await?;
        }
        Ok(())
    }

    async fn flush_kind(&mut self, table: &str, kind: WriteKind) -> OrmResult<()> {
        let key = (table.to_string(), kind);
        let Some(mut pending) = self.take(table, kind) else {
            self.stalled.remove(&key);
            return Ok(());
        };
        tracing::debug!(target: "myorm.queue", table, %kind, size = pending.len(), "flushing");

        while !pending.is_empty() {
            let rest = pending.split_off(self.chunk_len(kind, &pending));
            if let Err(e) = self.write_chunk(table, kind, &pending).await {
                pending.extend(rest);
                tracing::debug!(
                    target: "myorm.queue",
                    table,
                    %kind,
                    requeued = pending.len(),
                    error = %e,
                    "flush failed"
                );
                self.entries
                    .entry(table.to_string())
                    .or_default()
                    .insert(kind, pending);
                self.stalled.insert(key);
                return Err(e);
            }
            pending = rest;
        }
        self.stalled.remove(&key);
        Ok(())
    }

    /// Length of the next chunk: at most `threshold` entities whose
    /// placeholders fit in one statement, and never less than one.
    fn chunk_len(&self, kind: WriteKind, pending: &[Entity]) -> usize {
        let mut budget = MAX_PLACEHOLDERS;
        let mut len = 0;
        for entity in pending.iter().take(self.threshold) {
            let cost = kind.placeholders(entity);
            if len > 0 && cost > budget {
                break;
            }
            budget = budget.saturating_sub(cost);
            len += 1;
        }
        len.max(1).min(pending.len())
    }

    /// Remove a key, dropping the table entry once it has no kinds left.
    fn take(&mut self, table: &str, kind: WriteKind) -> Option<Vec<Entity>> {
        let kinds = self.entries.get_mut(table)?;
        let pending = kinds.remove(&kind);
        if kinds.is_empty() {
            self.entries.remove(table);
        }
        pending.filter(|entities| !entities.is_empty())
    }

    async fn write_chunk(&self, table: &str, kind: WriteKind, chunk: &[Entity]) -> OrmResult<()> {
        let outcome = match kind {
            WriteKind::Insert => {
                self.db
                    .insert_many(table, chunk, InsertOptions::upsert())
                    .await?
            }
            WriteKind::Update => self.db.update_many(table, chunk).await?,
            WriteKind::Remove => {
                let targets: Vec<Target> = chunk.iter().cloned().map(Target::Entity).collect();
                self.db.remove_many(table, &targets).await?
            }
        };
        tracing::debug!(
            target: "myorm.queue",
            table,
            %kind,
            entities = chunk.len(),
            rows_affected = outcome.rows_affected,
            "chunk written"
        );
        Ok(())
    }
}

impl<C> Drop for WriteQueue<'_, C> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            let tables: Vec<&str> = self.entries.keys().map(String::as_str).collect();
            tracing::warn!(target: "myorm.queue", ?tables, "write queue dropped with unflushed entities");
        }
    }
}
