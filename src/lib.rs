//! # data-duplicator
//!
//! Dependency-aware data duplication engine for relational schemas.
//!
//! Given a schema snapshot with foreign-key relationships and a set of
//! selected tables - each tagged with an operation (copy, lookup, or
//! insert-missing) - the engine:
//!
//! - derives a directed reference graph of single-column foreign keys
//! - computes a safe insertion order, demoting unresolved optional
//!   references to back references and rejecting mandatory cycles
//! - streams source rows into the destination with backpressure
//! - remaps auto-generated primary keys across the copy via per-table
//!   id maps
//! - wraps the whole job in one transaction with mutually exclusive
//!   commit/rollback
//!
//! The destination store is consumed behind the [`SqlTarget`] trait, so
//! SQL dialect differences are opaque to the engine.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use data_duplicator::{DataDuplicator, DuplicatorItem, Operation};
//!
//! # async fn demo(
//! #     target: Arc<dyn data_duplicator::SqlTarget>,
//! #     db: data_duplicator::Database,
//! #     artists: Box<dyn data_duplicator::RowSource>,
//! #     albums: Box<dyn data_duplicator::RowSource>,
//! # ) -> data_duplicator::Result<()> {
//! let items = vec![
//!     DuplicatorItem::new("artists", Operation::Copy, artists),
//!     DuplicatorItem::new("albums", Operation::Copy, albums),
//! ];
//! let report = DataDuplicator::new(target, db, items).run().await?;
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod duplicator;
pub mod error;
pub mod executor;
pub mod graph;
pub mod idmap;
pub mod item;
pub mod plan;
pub mod stream;

// Re-exports for convenient access
pub use crate::core::schema::{Column, Database, ForeignKey, Table};
pub use crate::core::traits::{RowSource, SqlTarget};
pub use crate::core::value::{KeyValue, Record, SqlValue};
pub use duplicator::{DataDuplicator, ItemReport, RunReport};
pub use error::{DuplicatorError, Result};
pub use executor::ItemStats;
pub use graph::{ItemId, RefId, Reference, ReferenceGraph};
pub use item::{DuplicatorItem, Operation};
pub use plan::{create_plan, Plan, PlannedItem};
pub use stream::{pipe_rows, ChunkHandler, RowStream, StreamChunk};
