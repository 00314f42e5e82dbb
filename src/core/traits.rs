//! Core traits at the engine's external seams.
//!
//! - [`SqlTarget`]: executes commands against the destination store. All
//!   engine-side SQL (inserts, match selects, identity readback,
//!   transaction control) goes through this one abstraction, so dialect
//!   differences between destination engines stay opaque to the core.
//! - [`RowSource`]: opens the lazy row stream for one item. Sources are
//!   not assumed restartable; the engine opens each exactly once.

use async_trait::async_trait;

use crate::error::Result;
use crate::stream::RowStream;

use super::schema::Table;
use super::value::SqlValue;

/// Command execution capability against the destination store.
///
/// Implementations own connection handling and SQL dialect. Every method
/// runs on the same connection/transaction for the lifetime of a run.
#[async_trait]
pub trait SqlTarget: Send + Sync {
    /// Insert one row: `INSERT INTO table (columns) VALUES (values)`.
    ///
    /// `columns` and `values` are parallel slices.
    async fn insert(&self, table: &Table, columns: &[String], values: &[SqlValue])
        -> Result<()>;

    /// Select `select_column` from `table` where `match_column` equals
    /// `value` (parameterized single-equality predicate). Returns the
    /// first matching value, or `None` when no row matches.
    async fn select_by_match(
        &self,
        table: &Table,
        select_column: &str,
        match_column: &str,
        value: &SqlValue,
    ) -> Result<Option<SqlValue>>;

    /// Read back the identity/sequence value most recently assigned to
    /// `auto_column` of `table` on this connection.
    async fn last_insert_id(&self, table: &Table, auto_column: &str) -> Result<Option<SqlValue>>;

    /// Begin the run-spanning transaction.
    async fn begin(&self) -> Result<()>;

    /// Commit the transaction.
    async fn commit(&self) -> Result<()>;

    /// Roll back the transaction.
    async fn rollback(&self) -> Result<()>;
}

/// Lazy row source for one duplication item.
#[async_trait]
pub trait RowSource: Send {
    /// Open the stream. Called exactly once per run; the stream yields a
    /// header chunk first, then row chunks.
    async fn open(&mut self) -> Result<RowStream>;
}
