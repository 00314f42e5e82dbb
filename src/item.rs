//! User-facing duplication item definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::traits::RowSource;

/// Per-row reconciliation semantics for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Always insert the source row, assigning a fresh key.
    Copy,

    /// Match the source row against existing destination rows by the first
    /// match column; map the key when found, count it missing otherwise.
    /// Never inserts.
    Lookup,

    /// Like [`Operation::Lookup`], but a miss falls through to the
    /// [`Operation::Copy`] insert path.
    InsertMissing,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Copy => write!(f, "copy"),
            Operation::Lookup => write!(f, "lookup"),
            Operation::InsertMissing => write!(f, "insertMissing"),
        }
    }
}

/// A request to duplicate one table.
pub struct DuplicatorItem {
    /// Table name (matched case-insensitively against the schema snapshot).
    pub name: String,

    /// Chosen operation.
    pub operation: Operation,

    /// Ordered match columns for lookup-style operations. Only the first
    /// is consulted.
    pub match_columns: Vec<String>,

    /// Lazy row source, opened once during execution.
    pub source: Box<dyn RowSource>,
}

impl DuplicatorItem {
    /// Create an item with no match columns.
    pub fn new(
        name: impl Into<String>,
        operation: Operation,
        source: Box<dyn RowSource>,
    ) -> Self {
        Self {
            name: name.into(),
            operation,
            match_columns: Vec::new(),
            source,
        }
    }

    /// Set the match columns for lookup-style operations.
    pub fn with_match_columns(mut self, columns: Vec<String>) -> Self {
        self.match_columns = columns;
        self
    }
}

impl fmt::Debug for DuplicatorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicatorItem")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("match_columns", &self.match_columns)
            .finish_non_exhaustive()
    }
}
