//! Duplication run orchestration.
//!
//! [`DataDuplicator`] drives a whole job: it resolves the selected tables
//! against the schema snapshot, derives the reference graph, plans the
//! insertion order, then executes every item strictly in plan order inside
//! one transaction. Item N+1 never starts before item N's id-map writes
//! are complete, since it may depend on them.
//!
//! Commit and rollback are mutually exclusive: on the first item failure
//! the run rolls back, skips commit, and returns the triggering error.
//!
//! Back-reference columns dropped by the planner are never revisited: a
//! row inserted without an optional foreign key keeps the destination
//! default even when the referenced table is processed later in the same
//! run.

use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::schema::{Database, Table};
use crate::core::traits::{RowSource, SqlTarget};
use crate::error::{DuplicatorError, Result};
use crate::executor::{execute_item, ItemStats, PreparedItem};
use crate::graph::ReferenceGraph;
use crate::idmap::IdMap;
use crate::item::{DuplicatorItem, Operation};
use crate::plan::{create_plan, Plan};

/// Dependency-aware data duplication engine.
pub struct DataDuplicator {
    target: Arc<dyn SqlTarget>,
    db: Database,
    items: Vec<DuplicatorItem>,
}

/// Outcome of one item within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    /// Table name.
    pub table: String,

    /// Operation that was applied.
    pub operation: Operation,

    /// Row counters.
    pub stats: ItemStats,
}

/// Result of a duplication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Per-item outcomes, in execution order.
    pub items: Vec<ItemReport>,

    /// Total rows inserted across all items.
    pub total_inserted: u64,

    /// Total rows mapped across all items.
    pub total_mapped: u64,

    /// Total rows missing across all items.
    pub total_missing: u64,
}

impl RunReport {
    /// Convert to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl DataDuplicator {
    /// Create a duplicator over a target handle, a destination schema
    /// snapshot, and the user's item selection.
    pub fn new(target: Arc<dyn SqlTarget>, db: Database, items: Vec<DuplicatorItem>) -> Self {
        Self { target, db, items }
    }

    /// Execute the full plan inside one transaction and return per-item
    /// statistics.
    ///
    /// Planning failures ([`DuplicatorError::MandatoryCycle`], schema
    /// validation errors) abort before any database command is issued.
    pub async fn run(self) -> Result<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("Starting duplication run {}", run_id);

        let Self { target, db, items } = self;

        // Resolve and validate every item, then plan. All of this happens
        // before the transaction opens.
        let (mut prepared, mut sources) = prepare_items(&db, items)?;
        let tables: Vec<Table> = prepared.iter().map(|p| p.table.clone()).collect();
        let names: Vec<String> = prepared.iter().map(|p| p.name.clone()).collect();

        let graph = ReferenceGraph::build(&tables);
        let plan = create_plan(&graph, &names)?;
        resolve_references(&graph, &plan, &mut prepared);

        info!(
            "Planned {} item(s): {}",
            plan.items.len(),
            plan.items
                .iter()
                .map(|p| names[p.item].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        target.begin().await?;

        let mut reports = Vec::with_capacity(plan.items.len());
        let outcome = execute_plan(
            target.as_ref(),
            &plan,
            &prepared,
            &mut sources,
            &mut reports,
        )
        .await;

        if let Err(err) = outcome {
            error!("Duplication run {} failed, rolling back: {}", run_id, err);
            if let Err(rollback_err) = target.rollback().await {
                warn!("Rollback failed: {}", rollback_err);
            }
            return Err(err);
        }

        target.commit().await?;

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let report = RunReport {
            run_id,
            started_at,
            completed_at,
            duration_seconds,
            total_inserted: reports.iter().map(|r| r.stats.inserted).sum(),
            total_mapped: reports.iter().map(|r| r.stats.mapped).sum(),
            total_missing: reports.iter().map(|r| r.stats.missing).sum(),
            items: reports,
        };

        info!(
            "Duplication run {} completed: {} item(s), {} inserted, {} mapped, {} missing in {:.1}s",
            report.run_id,
            report.items.len(),
            report.total_inserted,
            report.total_mapped,
            report.total_missing,
            report.duration_seconds
        );

        Ok(report)
    }
}

/// Resolve each item's table and validate its operation requirements.
fn prepare_items(
    db: &Database,
    items: Vec<DuplicatorItem>,
) -> Result<(Vec<PreparedItem>, Vec<Box<dyn RowSource>>)> {
    let mut prepared = Vec::with_capacity(items.len());
    let mut sources = Vec::with_capacity(items.len());

    for item in items {
        let table = db
            .find_table(&item.name)
            .cloned()
            .ok_or_else(|| DuplicatorError::TableNotFound(item.name.clone()))?;
        let auto_column = table.auto_key_column().map(str::to_string);

        if item.operation != Operation::Copy {
            if auto_column.is_none() {
                return Err(DuplicatorError::MissingAutoKey {
                    table: item.name.clone(),
                    operation: item.operation.to_string(),
                });
            }
            if item.match_columns.is_empty() {
                return Err(DuplicatorError::MissingMatchColumn(item.name.clone()));
            }
        }

        prepared.push(PreparedItem {
            name: item.name,
            operation: item.operation,
            match_columns: item.match_columns,
            table,
            auto_column,
            is_referenced: false,
            refs_by_column: Default::default(),
            back_ref_columns: Default::default(),
        });
        sources.push(item.source);
    }

    Ok((prepared, sources))
}

/// Attach the planning outcome to each prepared item: resolved references
/// by column, back-reference columns, and the referenced flag.
fn resolve_references(graph: &ReferenceGraph, plan: &Plan, prepared: &mut [PreparedItem]) {
    for planned in &plan.items {
        let item = &mut prepared[planned.item];
        item.is_referenced = graph.is_referenced(planned.item);
        for &ref_id in graph.outgoing(planned.item) {
            let reference = graph.reference(ref_id);
            item.refs_by_column
                .insert(reference.column.clone(), reference.target);
        }
        for &ref_id in &planned.back_refs {
            item.back_ref_columns
                .insert(graph.reference(ref_id).column.clone());
        }
    }
}

/// Execute all items strictly in plan order on one logical thread.
async fn execute_plan(
    target: &dyn SqlTarget,
    plan: &Plan,
    prepared: &[PreparedItem],
    sources: &mut [Box<dyn RowSource>],
    reports: &mut Vec<ItemReport>,
) -> Result<()> {
    let mut id_maps: Vec<IdMap> = (0..prepared.len()).map(|_| IdMap::new()).collect();

    for planned in &plan.items {
        let item = &prepared[planned.item];

        // Take this item's map out of the arena so the already-populated
        // maps of its dependencies stay readable while it is written.
        let mut own_map = mem::take(&mut id_maps[planned.item]);
        let stats = execute_item(
            target,
            item,
            sources[planned.item].as_mut(),
            &id_maps,
            &mut own_map,
        )
        .await?;
        id_maps[planned.item] = own_map;

        info!(
            "Duplicated {}: inserted {} rows, mapped {} rows, missing {} rows",
            item.name, stats.inserted, stats.mapped, stats.missing
        );
        reports.push(ItemReport {
            table: item.name.clone(),
            operation: item.operation,
            stats,
        });
    }

    Ok(())
}
