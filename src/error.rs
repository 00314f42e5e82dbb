//! Error types for the duplication engine.

use thiserror::Error;

/// Main error type for duplication operations.
#[derive(Error, Debug)]
pub enum DuplicatorError {
    /// A cycle exists among mandatory references - unplannable without
    /// schema changes. Raised before any database command runs.
    #[error("Cycle in mandatory references among tables: {}", tables.join(", "))]
    MandatoryCycle {
        /// Tables that could not be placed in the plan.
        tables: Vec<String>,
    },

    /// A selected table is missing from the destination schema snapshot.
    #[error("Table not found in schema: {0}")]
    TableNotFound(String),

    /// Lookup-style operations need a single-column auto-generated primary
    /// key to select and map.
    #[error("Table {table} has no single-column auto-generated primary key - required for {operation} items")]
    MissingAutoKey { table: String, operation: String },

    /// Lookup-style operations need at least one match column.
    #[error("Item for table {0} has no match columns")]
    MissingMatchColumn(String),

    /// A foreign-key column's source value has no id-map entry.
    #[error("No id mapping for {table}.{column} source value {value}")]
    UnresolvedMapping {
        table: String,
        column: String,
        value: String,
    },

    /// A destination command (insert, select, transaction control) failed.
    #[error("Target command failed: {message}")]
    Command { message: String },

    /// The row source failed while producing chunks.
    #[error("Row source error: {message}")]
    Source { message: String },

    /// JSON serialization error (report output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DuplicatorError {
    /// Build a [`DuplicatorError::Command`] from any displayable cause.
    pub fn command(message: impl ToString) -> Self {
        DuplicatorError::Command {
            message: message.to_string(),
        }
    }

    /// Build a [`DuplicatorError::Source`] from any displayable cause.
    pub fn source(message: impl ToString) -> Self {
        DuplicatorError::Source {
            message: message.to_string(),
        }
    }
}

/// Result type alias for duplication operations.
pub type Result<T> = std::result::Result<T, DuplicatorError>;
