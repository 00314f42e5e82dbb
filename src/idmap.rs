//! Per-table old-key to new-key mappings.

use std::collections::HashMap;

use tracing::debug;

use crate::core::value::{KeyValue, SqlValue};

/// Mapping from source-side key values to destination-side key values for
/// one table.
///
/// Created empty before the table executes, populated row by row during
/// its own execution, then consulted read-only by dependent tables later
/// in the plan. Entries are write-once: the first mapping for an old key
/// wins and later writes are ignored.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    entries: HashMap<KeyValue, SqlValue>,
}

impl IdMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. A repeated old key is ignored.
    pub fn insert(&mut self, old: KeyValue, new: SqlValue) {
        use std::collections::hash_map::Entry;
        match self.entries.entry(old) {
            Entry::Vacant(entry) => {
                entry.insert(new);
            }
            Entry::Occupied(entry) => {
                debug!("Ignoring duplicate id mapping for key {}", entry.key());
            }
        }
    }

    /// Look up the destination-side value for a source-side key.
    pub fn get(&self, old: &KeyValue) -> Option<&SqlValue> {
        self.entries.get(old)
    }

    /// Number of recorded mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no mappings were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut map = IdMap::new();
        map.insert(KeyValue::Int(5), SqlValue::I64(101));
        assert_eq!(map.get(&KeyValue::Int(5)), Some(&SqlValue::I64(101)));
        assert_eq!(map.get(&KeyValue::Int(6)), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_first_write_wins() {
        let mut map = IdMap::new();
        map.insert(KeyValue::Int(5), SqlValue::I64(101));
        map.insert(KeyValue::Int(5), SqlValue::I64(999));
        assert_eq!(map.get(&KeyValue::Int(5)), Some(&SqlValue::I64(101)));
    }
}
