//! Foreign-key reference graph over the selected items.
//!
//! The graph is an adjacency structure over stable item indices rather
//! than live object pointers, so planning can run as pure functions over
//! indices. Only single-column foreign keys whose target table is also a
//! selected item produce edges; everything else is plain column data.

use crate::core::schema::{ForeignKey, Table};

/// Stable index of an item in the run's item arena.
pub type ItemId = usize;

/// Stable index of a reference in the graph.
pub type RefId = usize;

/// A directed foreign-key edge between two selected items.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Referencing (base) item.
    pub base: ItemId,

    /// Referenced (target) item.
    pub target: ItemId,

    /// Foreign-key column name on the base table.
    pub column: String,

    /// True iff the base column is non-nullable. Mandatory references
    /// constrain insertion order; optional ones may be demoted to back
    /// references by the planner.
    pub mandatory: bool,

    /// The originating foreign-key definition.
    pub foreign_key: ForeignKey,
}

/// Directed graph of single-column foreign-key edges between items.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    references: Vec<Reference>,
    outgoing: Vec<Vec<RefId>>,
    is_referenced: Vec<bool>,
}

impl ReferenceGraph {
    /// Build the graph from the items' resolved tables. `tables[i]` is the
    /// destination table of item `i`.
    ///
    /// Multi-column foreign keys and keys pointing outside the selected
    /// set are ignored without error: the relationship is simply not
    /// tracked and the column rides along as ordinary data.
    pub fn build(tables: &[Table]) -> Self {
        let mut graph = Self {
            references: Vec::new(),
            outgoing: vec![Vec::new(); tables.len()],
            is_referenced: vec![false; tables.len()],
        };

        for (base, table) in tables.iter().enumerate() {
            for fk in &table.foreign_keys {
                if !fk.is_single_column() {
                    continue;
                }
                let Some(target) = tables
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(&fk.ref_table))
                else {
                    continue;
                };

                let column = fk.columns[0].clone();
                let mandatory = table
                    .find_column(&column)
                    .map(|c| !c.is_nullable)
                    .unwrap_or(false);

                let ref_id = graph.references.len();
                graph.references.push(Reference {
                    base,
                    target,
                    column,
                    mandatory,
                    foreign_key: fk.clone(),
                });
                graph.outgoing[base].push(ref_id);
                graph.is_referenced[target] = true;
            }
        }

        graph
    }

    /// Number of items the graph was built over.
    pub fn item_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Look up a reference by id.
    pub fn reference(&self, id: RefId) -> &Reference {
        &self.references[id]
    }

    /// Outgoing reference ids of an item.
    pub fn outgoing(&self, item: ItemId) -> &[RefId] {
        &self.outgoing[item]
    }

    /// Whether any other selected item references this one. Referenced
    /// items with an auto-generated key get an id map during execution.
    pub fn is_referenced(&self, item: ItemId) -> bool {
        self.is_referenced[item]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Column;

    fn make_column(name: &str, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: "int".to_string(),
            is_nullable: nullable,
            is_auto_generated: false,
        }
    }

    fn make_fk(column: &str, ref_table: &str) -> ForeignKey {
        ForeignKey {
            name: format!("fk_{}_{}", column, ref_table),
            columns: vec![column.to_string()],
            ref_table: ref_table.to_string(),
            ref_columns: vec!["id".to_string()],
        }
    }

    fn make_table(name: &str, columns: Vec<Column>, fks: Vec<ForeignKey>) -> Table {
        Table {
            schema: "public".to_string(),
            name: name.to_string(),
            columns,
            primary_key: vec![],
            foreign_keys: fks,
        }
    }

    #[test]
    fn test_build_tracks_mandatory_and_referenced() {
        let tables = vec![
            make_table(
                "albums",
                vec![make_column("artist_id", false)],
                vec![make_fk("artist_id", "Artists")],
            ),
            make_table("artists", vec![], vec![]),
        ];

        let graph = ReferenceGraph::build(&tables);
        assert_eq!(graph.item_count(), 2);
        assert_eq!(graph.outgoing(0).len(), 1);
        let reference = graph.reference(graph.outgoing(0)[0]);
        assert_eq!(reference.target, 1);
        assert!(reference.mandatory);
        assert!(graph.is_referenced(1));
        assert!(!graph.is_referenced(0));
    }

    #[test]
    fn test_multi_column_fk_ignored() {
        let fk = ForeignKey {
            name: "fk_composite".to_string(),
            columns: vec!["a".to_string(), "b".to_string()],
            ref_table: "other".to_string(),
            ref_columns: vec!["a".to_string(), "b".to_string()],
        };
        let tables = vec![
            make_table("base", vec![make_column("a", false)], vec![fk]),
            make_table("other", vec![], vec![]),
        ];

        let graph = ReferenceGraph::build(&tables);
        assert!(graph.outgoing(0).is_empty());
        assert!(!graph.is_referenced(1));
    }

    #[test]
    fn test_fk_outside_selection_ignored() {
        let tables = vec![make_table(
            "base",
            vec![make_column("ext_id", false)],
            vec![make_fk("ext_id", "unselected")],
        )];

        let graph = ReferenceGraph::build(&tables);
        assert!(graph.outgoing(0).is_empty());
    }

    #[test]
    fn test_nullable_fk_is_optional() {
        let tables = vec![
            make_table(
                "nodes",
                vec![make_column("parent_id", true)],
                vec![make_fk("parent_id", "nodes")],
            ),
        ];

        let graph = ReferenceGraph::build(&tables);
        let reference = graph.reference(graph.outgoing(0)[0]);
        assert!(!reference.mandatory);
        assert_eq!(reference.base, reference.target);
    }
}
