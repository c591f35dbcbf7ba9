use std::collections::hash_map::Entry;

use crate::data_structures::{EventId, EventTable};

/// Which timestamp survives when the same identifier is seen more than once.
/// The batch schema keeps the latest observation, the height schema the
/// earliest (see `LogSchema::keep_rule`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepRule {
    Earliest,
    Latest,
}

impl KeepRule {
    fn prefers(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            KeepRule::Latest => candidate > incumbent,
            KeepRule::Earliest => candidate < incumbent,
        }
    }
}

/// Inserts one observation, resolving an identifier collision with `keep`.
pub fn keep_insert(table: &mut EventTable, id: EventId, timestamp: f64, keep: KeepRule) {
    match table.entry(id) {
        Entry::Occupied(mut entry) => {
            if keep.prefers(timestamp, *entry.get()) {
                entry.insert(timestamp);
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(timestamp);
        }
    }
}

/// Folds one source table into `dst`. Pairwise max/min per key, so the fold
/// is commutative and associative over sources; input order never matters.
pub fn fold_into(dst: &mut EventTable, src: impl IntoIterator<Item = (EventId, f64)>, keep: KeepRule) {
    for (id, timestamp) in src {
        keep_insert(dst, id, timestamp, keep);
    }
}

/// Reduces any number of same-kind per-node tables into one global table.
pub fn merge_tables(tables: impl IntoIterator<Item = EventTable>, keep: KeepRule) -> EventTable {
    let mut merged = EventTable::new();
    for table in tables {
        fold_into(&mut merged, table, keep);
    }
    merged
}
