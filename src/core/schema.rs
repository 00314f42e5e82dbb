//! Schema metadata types for the duplication engine.
//!
//! These types provide a database-agnostic snapshot of destination schema
//! metadata. The engine only consumes what reference planning and payload
//! construction need: column names, nullability, auto-generated flags,
//! primary keys, and foreign keys. Table-name matching is case-insensitive
//! throughout.

use serde::{Deserialize, Serialize};

/// Snapshot of the destination schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    /// Table definitions.
    pub tables: Vec<Table>,
}

impl Database {
    /// Find a table by pure (unqualified) name, case-insensitively.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Schema name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Column definitions, in schema order.
    pub columns: Vec<Column>,

    /// Primary key column names, in key order. Empty if no primary key.
    pub primary_key: Vec<String>,

    /// Foreign key constraints.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Find a column by name.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The auto-generated key column, if the table has exactly one primary
    /// key column and that column is auto-generated. Tables with composite
    /// keys or non-generated keys have no auto key and never get an id map.
    pub fn auto_key_column(&self) -> Option<&str> {
        if self.primary_key.len() != 1 {
            return None;
        }
        let pk = &self.primary_key[0];
        self.find_column(pk)
            .filter(|c| c.is_auto_generated)
            .map(|c| c.name.as_str())
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "int", "varchar"). Informational only.
    #[serde(default)]
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Whether values are assigned by the store (identity/sequence).
    pub is_auto_generated: bool,
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Referencing column names, in constraint order.
    pub columns: Vec<String>,

    /// Referenced table name (pure name, matched case-insensitively).
    pub ref_table: String,

    /// Referenced column names.
    pub ref_columns: Vec<String>,
}

impl ForeignKey {
    /// Whether this key participates in reference planning. Only
    /// single-column keys do; composite keys are treated as plain data.
    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }
}
