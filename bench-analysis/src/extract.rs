use log::debug;
use regex::Regex;

use crate::data_structures::{NodeParseResult, RunConfig};
use crate::error::AnalysisError;
use crate::merge;
use crate::schema::{LogSchema, PatternTable, CRASH_MARKER};

/// Extracts one node's event tables and config snapshot from its raw log
/// text. Pure function: same text and schema always give the same result.
///
/// A crash marker anywhere in the text fails the parse before any table is
/// built. A missing event line is not an error (that identifier simply
/// contributes no sample), but a missing config line is, since metrics
/// cannot be computed without the config.
pub fn parse_node(text: &str, schema: LogSchema) -> Result<NodeParseResult, AnalysisError> {
    if text.contains(CRASH_MARKER) {
        return Err(AnalysisError::CrashDetected);
    }

    let patterns = PatternTable::for_schema(schema);
    let keep = schema.keep_rule();
    let mut result = NodeParseResult::default();

    if let Some(arrival) = &patterns.batch_arrival {
        for caps in arrival.captures_iter(text) {
            let timestamp = schema.parse_timestamp(&caps[1])?;
            result.batch_arrivals.insert(caps[2].to_string(), timestamp);
        }
    }

    // Proposals can repeat within one log under protocol replay; dedup here
    // with the same keep rule the cross-node merge uses. Commits get the
    // same treatment.
    for caps in patterns.proposal.captures_iter(text) {
        let timestamp = schema.parse_timestamp(&caps[1])?;
        merge::keep_insert(&mut result.proposals, caps[2].to_string(), timestamp, keep);
    }
    for caps in patterns.commit.captures_iter(text) {
        let timestamp = schema.parse_timestamp(&caps[1])?;
        merge::keep_insert(&mut result.commits, caps[2].to_string(), timestamp, keep);
    }

    if let Some(config) = &patterns.config {
        result.config = Some(RunConfig {
            faults: capture_u64(&config.faults, text, "faults")?,
            tx_size: capture_u64(&config.tx_size, text, "tx size")?,
            batch_size: capture_u64(&config.batch_size, text, "batch size")?,
            rate: capture_u64(&config.rate, text, "rate")?,
        });
    }

    debug!(
        "extracted {} arrivals, {} proposals, {} commits",
        result.batch_arrivals.len(),
        result.proposals.len(),
        result.commits.len()
    );
    Ok(result)
}

fn capture_u64(re: &Regex, text: &str, field: &'static str) -> Result<u64, AnalysisError> {
    re.captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or(AnalysisError::MissingConfigField { field })
}
