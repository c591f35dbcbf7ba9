use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use crate::error::AnalysisError;
use crate::merge::KeepRule;

/// The two incompatible log line grammars the analyzer understands, one per
/// protocol family. Selection is always explicit; nothing is auto-detected
/// from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSchema {
    /// Committee-message grammar keyed by batch id, local-style timestamps
    /// (`YYYY/MM/DD HH:MM:SS.ffffff`). Carries its own config lines and
    /// observes batch arrivals, so end-to-end metrics exist.
    Batch,
    /// Block-height grammar keyed by height, ISO-8601 timestamps with a
    /// literal `Z`. No config lines and no batch-arrival concept.
    Height,
}

impl LogSchema {
    /// Log files are named `node-info-<i>.log` (batch) or `node-<i>.log`
    /// (height).
    pub fn log_prefix(self) -> &'static str {
        match self {
            LogSchema::Batch => "node-info-",
            LogSchema::Height => "node-",
        }
    }

    /// Duplicate-identifier rule, applied both to local proposal dedup and
    /// to the cross-node merge. The two schemas deliberately disagree; see
    /// DESIGN.md before touching this.
    pub fn keep_rule(self) -> KeepRule {
        match self {
            LogSchema::Batch => KeepRule::Latest,
            LogSchema::Height => KeepRule::Earliest,
        }
    }

    /// Whether batch arrivals are observable, i.e. whether end-to-end
    /// metrics can be computed at all.
    pub fn supports_end_to_end(self) -> bool {
        matches!(self, LogSchema::Batch)
    }

    /// Parses a captured timestamp string to Unix-epoch seconds. The format
    /// is pinned by the schema, never sniffed from the text.
    ///
    /// The batch grammar's timestamps are naive (no zone); they are anchored
    /// to UTC so results do not depend on the analyzing host. Metrics only
    /// ever subtract two of them, so the anchor cancels.
    pub fn parse_timestamp(self, raw: &str) -> Result<f64, AnalysisError> {
        let micros = match self {
            LogSchema::Batch => NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S%.f")
                .map_err(|source| AnalysisError::Timestamp {
                    value: raw.to_string(),
                    source,
                })?
                .and_utc()
                .timestamp_micros(),
            LogSchema::Height => DateTime::parse_from_rfc3339(raw)
                .map_err(|source| AnalysisError::Timestamp {
                    value: raw.to_string(),
                    source,
                })?
                .timestamp_micros(),
        };
        Ok(micros as f64 / 1_000_000.0)
    }
}

/// Any log containing this substring marks the whole run as unusable.
pub const CRASH_MARKER: &str = "panic";

/// Compiled line matchers for one schema. Group 1 captures the timestamp,
/// group 2 the identifier.
pub struct PatternTable {
    /// `None` under the height schema, which cannot observe arrivals.
    pub batch_arrival: Option<Regex>,
    pub proposal: Regex,
    pub commit: Regex,
    pub config: Option<ConfigPatterns>,
}

/// One-time config lines (batch schema only). Group 1 captures the value.
pub struct ConfigPatterns {
    pub faults: Regex,
    pub tx_size: Regex,
    pub batch_size: Regex,
    pub rate: Regex,
}

impl PatternTable {
    pub fn for_schema(schema: LogSchema) -> Self {
        match schema {
            LogSchema::Batch => PatternTable {
                batch_arrival: Some(
                    Regex::new(r"\[INFO\] (.*) pool.* Received Batch (\d+)").unwrap(),
                ),
                proposal: Regex::new(
                    r"\[INFO\] (.*) core.* create Block epoch \d+ node \d+ batch_id (\d+)",
                )
                .unwrap(),
                commit: Regex::new(
                    r"\[INFO\] (.*) commitor.* commit Block epoch \d+ node \d+ batch_id (\d+)",
                )
                .unwrap(),
                config: Some(ConfigPatterns {
                    faults: Regex::new(r"Consensus DDos: .*, Faults: (\d+)").unwrap(),
                    tx_size: Regex::new(r"Transaction pool tx size set to (\d+)").unwrap(),
                    batch_size: Regex::new(r"Transaction pool batch size set to (\d+)").unwrap(),
                    rate: Regex::new(r"Transaction pool tx rate set to (\d+)").unwrap(),
                }),
            },
            LogSchema::Height => PatternTable {
                batch_arrival: None,
                proposal: Regex::new(
                    r"(?m)^(\S+Z) .*broadcast a new proposal and proof: height=(\d+)",
                )
                .unwrap(),
                commit: Regex::new(r"(?m)^(\S+Z) .*commit the block: block_index=(\d+)").unwrap(),
                config: None,
            },
        }
    }
}
