use serde::{Deserialize, Serialize};

use crate::data_structures::{EventTable, MergedResult, RunMeta};

fn min_value(table: &EventTable) -> f64 {
    table.values().copied().fold(f64::INFINITY, f64::min)
}

fn max_value(table: &EventTable) -> f64 {
    table.values().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Mean of `end[k] - start[k]` over keys present in both tables, or 0 when
/// no key is shared.
fn mean_delta(end: &EventTable, start: &EventTable) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (id, end_ts) in end {
        if let Some(start_ts) = start.get(id) {
            sum += end_ts - start_ts;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// `(tps, duration)` for commits measured against `start` timestamps. Both
/// zero when nothing committed; tps zero when the observed duration is not
/// positive, so no division ever happens on a degenerate run.
fn throughput(commits: &EventTable, start: &EventTable, batch_size: u64) -> (f64, f64) {
    if commits.is_empty() || start.is_empty() {
        return (0.0, 0.0);
    }
    let duration = max_value(commits) - min_value(start);
    if duration <= 0.0 {
        return (0.0, duration);
    }
    let tps = (commits.len() as u64 * batch_size) as f64 / duration;
    (tps, duration)
}

impl MergedResult {
    /// Committed tx/s and the span from first proposal to last commit.
    pub fn consensus_throughput(&self) -> (f64, f64) {
        throughput(&self.commits, &self.proposals, self.config.batch_size)
    }

    /// Mean proposal-to-commit time in seconds over shared identifiers.
    pub fn consensus_latency(&self) -> f64 {
        mean_delta(&self.commits, &self.proposals)
    }

    /// Like `consensus_throughput` but anchored at the first batch arrival.
    /// `None` under the height schema, which cannot observe arrivals.
    pub fn end_to_end_throughput(&self) -> Option<(f64, f64)> {
        self.schema.supports_end_to_end().then(|| {
            throughput(&self.commits, &self.batch_arrivals, self.config.batch_size)
        })
    }

    /// Mean arrival-to-commit time in seconds over shared identifiers.
    pub fn end_to_end_latency(&self) -> Option<f64> {
        self.schema
            .supports_end_to_end()
            .then(|| mean_delta(&self.commits, &self.batch_arrivals))
    }
}

/// The final externally consumed artifact: derived scalars plus the echoed
/// config and run metadata. Serializable so a driver can aggregate many
/// runs into a results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub protocol: String,
    pub ddos: bool,
    pub committee_size: usize,
    pub faults: u64,
    pub rate: u64,
    pub tx_size: u64,
    pub batch_size: u64,
    /// Execution duration in seconds: the end-to-end span when the schema
    /// observes arrivals, the consensus span otherwise.
    pub duration_s: f64,
    pub consensus_tps: f64,
    pub consensus_latency_ms: f64,
    pub end_to_end_tps: Option<f64>,
    pub end_to_end_latency_ms: Option<f64>,
}

impl BenchmarkMetrics {
    pub fn compute(merged: &MergedResult, meta: &RunMeta) -> Self {
        let (consensus_tps, consensus_duration) = merged.consensus_throughput();
        let consensus_latency_ms = merged.consensus_latency() * 1000.0;

        let (end_to_end_tps, end_to_end_latency_ms, duration_s) =
            match (merged.end_to_end_throughput(), merged.end_to_end_latency()) {
                (Some((tps, duration)), Some(latency)) => {
                    (Some(tps), Some(latency * 1000.0), duration)
                }
                _ => (None, None, consensus_duration),
            };

        BenchmarkMetrics {
            protocol: meta.protocol.clone(),
            ddos: meta.ddos,
            committee_size: merged.committee_size,
            faults: meta.faults,
            rate: merged.config.rate,
            tx_size: merged.config.tx_size,
            batch_size: merged.config.batch_size,
            duration_s,
            consensus_tps,
            consensus_latency_ms,
            end_to_end_tps,
            end_to_end_latency_ms,
        }
    }
}
