//! Execution planning: greedy topological ordering with cycle breaking.
//!
//! The planner repeatedly picks the next item in two passes, restarting
//! the search from scratch after every pick. This is O(n²) over the item
//! count, which is acceptable for the small selections this engine serves;
//! the cost model deliberately favors simplicity.

use tracing::debug;

use crate::error::{DuplicatorError, Result};
use crate::graph::{ItemId, RefId, ReferenceGraph};

/// One planned item: its arena index plus the optional references that
/// remained unresolved at planning time.
#[derive(Debug, Clone)]
pub struct PlannedItem {
    /// Item index in the run's arena.
    pub item: ItemId,

    /// Back references: optional references whose target was not yet
    /// planned when this item was placed. Their columns are excluded from
    /// insert payloads and are never patched in afterwards - the row keeps
    /// whatever default the destination applies.
    pub back_refs: Vec<RefId>,
}

/// The linear, dependency-respecting processing order for all items.
///
/// Every mandatory reference's target item precedes its base item.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Planned items, in execution order.
    pub items: Vec<PlannedItem>,
}

/// Compute the execution plan for all items in `graph`.
///
/// Fails with [`DuplicatorError::MandatoryCycle`] when the remaining
/// unplanned items form a cycle of mandatory references; no database
/// command has run at that point.
pub fn create_plan(graph: &ReferenceGraph, names: &[String]) -> Result<Plan> {
    let count = graph.item_count();
    let mut planned = vec![false; count];
    let mut plan = Plan::default();

    while plan.items.len() < count {
        let next = find_item_to_plan(graph, &planned)
            .ok_or_else(|| DuplicatorError::MandatoryCycle {
                tables: (0..count)
                    .filter(|&i| !planned[i])
                    .map(|i| names[i].clone())
                    .collect(),
            })?;

        if !next.back_refs.is_empty() {
            debug!(
                "Planned {} with {} back reference(s)",
                names[next.item],
                next.back_refs.len()
            );
        }

        planned[next.item] = true;
        plan.items.push(next);
    }

    Ok(plan)
}

/// Two-pass candidate search.
///
/// Strict pass: an item whose every outgoing reference targets a planned
/// item. Relaxed pass: an item whose every *mandatory* reference targets a
/// planned item; its unresolved (necessarily optional) references are
/// demoted to back references.
fn find_item_to_plan(graph: &ReferenceGraph, planned: &[bool]) -> Option<PlannedItem> {
    for item in 0..planned.len() {
        if planned[item] {
            continue;
        }
        if graph
            .outgoing(item)
            .iter()
            .all(|&r| planned[graph.reference(r).target])
        {
            return Some(PlannedItem {
                item,
                back_refs: Vec::new(),
            });
        }
    }

    for item in 0..planned.len() {
        if planned[item] {
            continue;
        }
        let satisfied = graph.outgoing(item).iter().all(|&r| {
            let reference = graph.reference(r);
            planned[reference.target] || !reference.mandatory
        });
        if satisfied {
            let back_refs = graph
                .outgoing(item)
                .iter()
                .copied()
                .filter(|&r| !planned[graph.reference(r).target])
                .collect();
            return Some(PlannedItem { item, back_refs });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ForeignKey, Table};

    fn make_table(name: &str, fks: Vec<(&str, &str, bool)>) -> Table {
        // fks: (column, ref_table, nullable)
        let columns = fks
            .iter()
            .map(|(col, _, nullable)| Column {
                name: col.to_string(),
                data_type: "int".to_string(),
                is_nullable: *nullable,
                is_auto_generated: false,
            })
            .collect();
        let foreign_keys = fks
            .iter()
            .map(|(col, ref_table, _)| ForeignKey {
                name: format!("fk_{}", col),
                columns: vec![col.to_string()],
                ref_table: ref_table.to_string(),
                ref_columns: vec!["id".to_string()],
            })
            .collect();
        Table {
            schema: "public".to_string(),
            name: name.to_string(),
            columns,
            primary_key: vec![],
            foreign_keys,
        }
    }

    fn plan_names(tables: Vec<Table>) -> Result<Vec<String>> {
        let names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
        let graph = ReferenceGraph::build(&tables);
        let plan = create_plan(&graph, &names)?;
        Ok(plan.items.iter().map(|p| names[p.item].clone()).collect())
    }

    #[test]
    fn test_chain_is_planned_leaf_first() {
        // a -> b -> c, both mandatory: expect c, b, a.
        let order = plan_names(vec![
            make_table("a", vec![("b_id", "b", false)]),
            make_table("b", vec![("c_id", "c", false)]),
            make_table("c", vec![]),
        ])
        .unwrap();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_optional_self_reference_uses_relaxed_pass() {
        let tables = vec![make_table("nodes", vec![("parent_id", "nodes", true)])];
        let names = vec!["nodes".to_string()];
        let graph = ReferenceGraph::build(&tables);

        let plan = create_plan(&graph, &names).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].back_refs.len(), 1);
        let back = graph.reference(plan.items[0].back_refs[0]);
        assert_eq!(back.column, "parent_id");
    }

    #[test]
    fn test_mandatory_cycle_fails() {
        let result = plan_names(vec![
            make_table("a", vec![("b_id", "b", false)]),
            make_table("b", vec![("a_id", "a", false)]),
        ]);
        match result {
            Err(DuplicatorError::MandatoryCycle { tables }) => {
                assert_eq!(tables, vec!["a", "b"]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_cycle_is_broken() {
        // a <-> b, one side nullable: plannable with one back reference.
        let tables = vec![
            make_table("a", vec![("b_id", "b", true)]),
            make_table("b", vec![("a_id", "a", false)]),
        ];
        let names = vec!["a".to_string(), "b".to_string()];
        let graph = ReferenceGraph::build(&tables);

        let plan = create_plan(&graph, &names).unwrap();
        assert_eq!(plan.items[0].item, 0);
        assert_eq!(plan.items[0].back_refs.len(), 1);
        assert_eq!(plan.items[1].item, 1);
        assert!(plan.items[1].back_refs.is_empty());
    }

    #[test]
    fn test_independent_items_keep_listed_order() {
        let order = plan_names(vec![
            make_table("x", vec![]),
            make_table("y", vec![]),
        ])
        .unwrap();
        assert_eq!(order, vec!["x", "y"]);
    }
}
