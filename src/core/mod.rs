//! Core types shared across the duplication engine.

pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{Column, Database, ForeignKey, Table};
pub use traits::{RowSource, SqlTarget};
pub use value::{KeyValue, Record, SqlValue};
