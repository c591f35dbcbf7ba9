use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::LogSchema;

/// Identifier shared by the three event kinds: a batch id under the batch
/// schema, a block height under the height schema. Kept as a string so both
/// schemas key the same table type.
pub type EventId = String;

/// One event kind's table: identifier -> Unix-epoch seconds.
pub type EventTable = HashMap<EventId, f64>;

/// Run-level parameters captured once per node log (batch schema) or
/// supplied externally (height schema).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Transaction size in bytes.
    pub tx_size: u64,
    /// Transactions per batch.
    pub batch_size: u64,
    /// Target input rate in tx/s.
    pub rate: u64,
    /// Byzantine node count.
    pub faults: u64,
}

/// Run metadata the benchmark driver knows but the logs do not.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub protocol: String,
    pub ddos: bool,
    pub faults: u64,
    /// Config to use under the height schema, whose logs carry none.
    /// Ignored under the batch schema.
    pub default_config: Option<RunConfig>,
}

impl RunMeta {
    pub fn new(protocol: impl Into<String>, ddos: bool, faults: u64) -> Self {
        RunMeta {
            protocol: protocol.into(),
            ddos,
            faults,
            default_config: None,
        }
    }
}

/// Everything extracted from a single node's log.
#[derive(Debug, Default)]
pub struct NodeParseResult {
    pub batch_arrivals: EventTable,
    pub proposals: EventTable,
    pub commits: EventTable,
    /// `None` under the height schema.
    pub config: Option<RunConfig>,
}

/// The per-node results folded into one global table per kind. Immutable
/// once built; the metrics layer only reads it.
#[derive(Debug)]
pub struct MergedResult {
    pub schema: LogSchema,
    pub batch_arrivals: EventTable,
    pub proposals: EventTable,
    pub commits: EventTable,
    /// Representative config: the first node's snapshot in sorted filename
    /// order. Variants across nodes are not reconciled.
    pub config: RunConfig,
    pub committee_size: usize,
}
