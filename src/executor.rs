//! Per-item execution: row streaming, payload construction, and the
//! copy / lookup / insertMissing operation semantics.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::schema::Table;
use crate::core::traits::{RowSource, SqlTarget};
use crate::core::value::{Record, SqlValue};
use crate::error::{DuplicatorError, Result};
use crate::graph::ItemId;
use crate::idmap::IdMap;
use crate::item::Operation;
use crate::stream::{pipe_rows, ChunkHandler};

/// Per-item outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    /// Rows inserted into the destination.
    pub inserted: u64,

    /// Rows matched to an existing destination row and key-mapped.
    pub mapped: u64,

    /// Rows with no destination match (lookup only; counted, not an error).
    pub missing: u64,
}

/// Fully resolved execution context for one planned item.
///
/// Built by the orchestrator after planning: the table is resolved from
/// the schema snapshot, references are split into resolved ones (column to
/// target item) and back-reference columns, and the auto key is validated
/// against the operation.
#[derive(Debug)]
pub(crate) struct PreparedItem {
    /// Item name as given by the caller.
    pub name: String,

    /// Chosen operation.
    pub operation: Operation,

    /// Ordered match columns (lookup-style operations).
    pub match_columns: Vec<String>,

    /// Resolved destination table.
    pub table: Table,

    /// Single-column auto-generated primary key, if the table has one.
    pub auto_column: Option<String>,

    /// Whether another selected item references this one. Only then is an
    /// id map populated on copy.
    pub is_referenced: bool,

    /// Foreign-key column name to target item, for every single-column
    /// reference inside the selection (back references included).
    pub refs_by_column: HashMap<String, ItemId>,

    /// Columns excluded from insert payloads because their target was not
    /// planned yet. Never patched afterwards.
    pub back_ref_columns: HashSet<String>,
}

/// Execute one planned item: open its row source and drain it through the
/// sequential pipe, applying the operation per row.
///
/// `id_maps` is the run's id-map arena; the executing item's own slot has
/// been taken out into `own_map` so already-processed maps stay readable
/// while this one is written.
pub(crate) async fn execute_item(
    target: &dyn SqlTarget,
    prepared: &PreparedItem,
    source: &mut dyn RowSource,
    id_maps: &[IdMap],
    own_map: &mut IdMap,
) -> Result<ItemStats> {
    let mut stream = source.open().await?;
    let mut handler = RowHandler {
        target,
        item: prepared,
        id_maps,
        own_map,
        stats: ItemStats::default(),
    };
    pipe_rows(&mut stream, &mut handler).await?;
    Ok(handler.stats)
}

/// Row-level handler carrying the mutable execution state for one item.
struct RowHandler<'a> {
    target: &'a dyn SqlTarget,
    item: &'a PreparedItem,
    id_maps: &'a [IdMap],
    own_map: &'a mut IdMap,
    stats: ItemStats,
}

#[async_trait]
impl ChunkHandler for RowHandler<'_> {
    async fn handle(&mut self, record: Record) -> Result<()> {
        match self.item.operation {
            Operation::Copy => self.do_copy(&record).await,
            Operation::Lookup | Operation::InsertMissing => self.do_lookup(&record).await,
        }
    }
}

impl RowHandler<'_> {
    /// Insert the record and, for referenced tables with an auto key,
    /// read back the assigned identity and record the id mapping.
    async fn do_copy(&mut self, record: &Record) -> Result<()> {
        let (columns, values) = self.build_insert_payload(record)?;
        self.target
            .insert(&self.item.table, &columns, &values)
            .await?;
        self.stats.inserted += 1;

        if let Some(auto) = self.item.auto_column.as_deref() {
            if self.item.is_referenced {
                let new_id = self.target.last_insert_id(&self.item.table, auto).await?;
                if let Some(new_id) = new_id {
                    match record.get(auto).and_then(SqlValue::as_key) {
                        Some(old) => self.own_map.insert(old, new_id),
                        None => debug!(
                            "{}: source row has no usable {} value, id mapping skipped",
                            self.item.name, auto
                        ),
                    }
                }
            }
        }

        Ok(())
    }

    /// Query the destination by the first match column. A hit maps the
    /// key; a miss either counts as missing (lookup) or falls through to
    /// the copy path (insertMissing).
    async fn do_lookup(&mut self, record: &Record) -> Result<()> {
        let auto = self.item.auto_column.as_deref().ok_or_else(|| {
            DuplicatorError::MissingAutoKey {
                table: self.item.name.clone(),
                operation: self.item.operation.to_string(),
            }
        })?;
        let match_column = self
            .item
            .match_columns
            .first()
            .ok_or_else(|| DuplicatorError::MissingMatchColumn(self.item.name.clone()))?;

        let match_value = record.get(match_column).cloned().unwrap_or(SqlValue::Null);
        let found = self
            .target
            .select_by_match(&self.item.table, auto, match_column, &match_value)
            .await?;

        match found {
            Some(new_id) => {
                self.stats.mapped += 1;
                if let Some(old) = record.get(auto).and_then(SqlValue::as_key) {
                    self.own_map.insert(old, new_id);
                }
            }
            None if self.item.operation == Operation::InsertMissing => {
                self.do_copy(record).await?;
            }
            None => {
                self.stats.missing += 1;
            }
        }

        Ok(())
    }

    /// Build the insert payload for one record.
    ///
    /// Starts from the destination table's columns in schema order,
    /// drops the auto-generated column (the store assigns a fresh value),
    /// drops back-reference columns (target not yet known), skips columns
    /// the record does not carry, and remaps every resolved foreign-key
    /// column through its target item's id map.
    fn build_insert_payload(&self, record: &Record) -> Result<(Vec<String>, Vec<SqlValue>)> {
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for column in &self.item.table.columns {
            let name = column.name.as_str();
            if self.item.auto_column.as_deref() == Some(name) {
                continue;
            }
            if self.item.back_ref_columns.contains(name) {
                continue;
            }
            let Some(value) = record.get(name) else {
                continue;
            };

            let value = match self.item.refs_by_column.get(name) {
                Some(&target) => self.remap(name, value, target)?,
                None => value.clone(),
            };

            columns.push(name.to_string());
            values.push(value);
        }

        Ok((columns, values))
    }

    /// Rewrite one foreign-key value through the target item's id map.
    ///
    /// NULL passes through untouched - a nullable key with no target is
    /// legitimate data. A non-null value without a mapping fails the run:
    /// inserting an undefined value would silently corrupt the copy.
    fn remap(&self, column: &str, value: &SqlValue, target: ItemId) -> Result<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        value
            .as_key()
            .and_then(|key| self.id_maps[target].get(&key).cloned())
            .ok_or_else(|| DuplicatorError::UnresolvedMapping {
                table: self.item.name.clone(),
                column: column.to_string(),
                value: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Column;
    use crate::core::value::KeyValue;

    fn make_column(name: &str, auto: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: "int".to_string(),
            is_nullable: true,
            is_auto_generated: auto,
        }
    }

    fn make_prepared() -> PreparedItem {
        PreparedItem {
            name: "albums".to_string(),
            operation: Operation::Copy,
            match_columns: vec![],
            table: Table {
                schema: "public".to_string(),
                name: "albums".to_string(),
                columns: vec![
                    make_column("id", true),
                    make_column("title", false),
                    make_column("artist_id", false),
                    make_column("label_id", false),
                ],
                primary_key: vec!["id".to_string()],
                foreign_keys: vec![],
            },
            auto_column: Some("id".to_string()),
            is_referenced: false,
            refs_by_column: HashMap::from([("artist_id".to_string(), 0)]),
            back_ref_columns: HashSet::from(["label_id".to_string()]),
        }
    }

    struct NullTarget;

    static NULL_TARGET: NullTarget = NullTarget;

    #[async_trait]
    impl SqlTarget for NullTarget {
        async fn insert(&self, _: &Table, _: &[String], _: &[SqlValue]) -> Result<()> {
            Ok(())
        }
        async fn select_by_match(
            &self,
            _: &Table,
            _: &str,
            _: &str,
            _: &SqlValue,
        ) -> Result<Option<SqlValue>> {
            Ok(None)
        }
        async fn last_insert_id(&self, _: &Table, _: &str) -> Result<Option<SqlValue>> {
            Ok(None)
        }
        async fn begin(&self) -> Result<()> {
            Ok(())
        }
        async fn commit(&self) -> Result<()> {
            Ok(())
        }
        async fn rollback(&self) -> Result<()> {
            Ok(())
        }
    }

    fn make_handler<'a>(
        prepared: &'a PreparedItem,
        id_maps: &'a [IdMap],
        own_map: &'a mut IdMap,
    ) -> RowHandler<'a> {
        RowHandler {
            target: &NULL_TARGET,
            item: prepared,
            id_maps,
            own_map,
            stats: ItemStats::default(),
        }
    }

    #[test]
    fn test_payload_strips_auto_and_back_ref_columns() {
        let prepared = make_prepared();
        let mut artist_map = IdMap::new();
        artist_map.insert(KeyValue::Int(3), SqlValue::I64(77));
        let id_maps = vec![artist_map];
        let mut own_map = IdMap::new();
        let handler = make_handler(&prepared, &id_maps, &mut own_map);

        let record = Record::new()
            .with("id", 5i64)
            .with("title", "first")
            .with("artist_id", 3i64)
            .with("label_id", 9i64)
            .with("unknown_column", 1i64);

        let (columns, values) = handler.build_insert_payload(&record).unwrap();
        assert_eq!(columns, vec!["title", "artist_id"]);
        assert_eq!(
            values,
            vec![SqlValue::Text("first".into()), SqlValue::I64(77)]
        );
    }

    #[test]
    fn test_payload_passes_null_fk_through() {
        let prepared = make_prepared();
        let id_maps = vec![IdMap::new()];
        let mut own_map = IdMap::new();
        let handler = make_handler(&prepared, &id_maps, &mut own_map);

        let record = Record::new()
            .with("title", "orphan")
            .with("artist_id", SqlValue::Null);

        let (columns, values) = handler.build_insert_payload(&record).unwrap();
        assert_eq!(columns, vec!["title", "artist_id"]);
        assert_eq!(values[1], SqlValue::Null);
    }

    #[test]
    fn test_payload_fails_fast_on_unresolved_mapping() {
        let prepared = make_prepared();
        let id_maps = vec![IdMap::new()];
        let mut own_map = IdMap::new();
        let handler = make_handler(&prepared, &id_maps, &mut own_map);

        let record = Record::new().with("artist_id", 42i64);
        let err = handler.build_insert_payload(&record).unwrap_err();
        match err {
            DuplicatorError::UnresolvedMapping { table, column, value } => {
                assert_eq!(table, "albums");
                assert_eq!(column, "artist_id");
                assert_eq!(value, "42");
            }
            other => panic!("expected unresolved mapping error, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_skips_columns_absent_from_record() {
        let prepared = make_prepared();
        let id_maps = vec![IdMap::new()];
        let mut own_map = IdMap::new();
        let handler = make_handler(&prepared, &id_maps, &mut own_map);

        let record = Record::new().with("title", "sparse");
        let (columns, _) = handler.build_insert_payload(&record).unwrap();
        assert_eq!(columns, vec!["title"]);
    }
}
