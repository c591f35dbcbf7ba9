use std::fmt::Write as _;
use std::path::Path;

use log::info;
use tokio::io::AsyncWriteExt;

use crate::error::AnalysisError;
use crate::metrics::BenchmarkMetrics;

/// Groups an integer with thousands separators, e.g. 1234567 -> "1,234,567".
fn group(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && i % 3 == lead % 3 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounds a metric to a whole number, then groups it. Exact .5 values
/// round away from zero; see DESIGN.md for the tie-break choice.
fn rounded(value: f64) -> String {
    group(value.round() as i64)
}

/// Renders the fixed-layout human-readable summary. The end-to-end block is
/// present only when the schema observed batch arrivals. Every field
/// tolerates a zeroed run (no commits at all).
pub fn render_summary(metrics: &BenchmarkMetrics) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("-----------------------------------------\n");
    out.push_str(" SUMMARY:\n");
    out.push_str("-----------------------------------------\n");
    out.push_str(" + CONFIG:\n");
    let _ = writeln!(out, " Protocol: {} ", metrics.protocol);
    let _ = writeln!(out, " DDOS attack: {} ", metrics.ddos);
    let _ = writeln!(out, " Committee size: {} nodes", metrics.committee_size);
    let _ = writeln!(out, " Input rate: {} tx/s", group(metrics.rate as i64));
    let _ = writeln!(out, " Transaction size: {} B", group(metrics.tx_size as i64));
    let _ = writeln!(out, " Batch size: {} tx/Batch", group(metrics.batch_size as i64));
    let _ = writeln!(out, " Faults: {} nodes", metrics.faults);
    let _ = writeln!(out, " Execution time: {} s", rounded(metrics.duration_s));
    out.push('\n');
    out.push_str(" + RESULTS:\n");
    let _ = writeln!(out, " Consensus TPS: {} tx/s", rounded(metrics.consensus_tps));
    let _ = writeln!(out, " Consensus latency: {} ms", rounded(metrics.consensus_latency_ms));
    if let (Some(tps), Some(latency)) = (metrics.end_to_end_tps, metrics.end_to_end_latency_ms) {
        out.push('\n');
        let _ = writeln!(out, " End-to-end TPS: {} tx/s", rounded(tps));
        let _ = writeln!(out, " End-to-end latency: {} ms", rounded(latency));
    }
    out.push_str("-----------------------------------------\n");
    out
}

/// Appends the rendered summary to `path`, creating the file if needed.
/// Never truncates: a results file accumulates one summary per run.
pub async fn append_summary(path: &Path, metrics: &BenchmarkMetrics) -> Result<(), AnalysisError> {
    let io_err = |source| AnalysisError::Io { path: path.to_path_buf(), source };
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .map_err(io_err)?;
    file.write_all(render_summary(metrics).as_bytes())
        .await
        .map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    info!("appended summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BenchmarkMetrics {
        BenchmarkMetrics {
            protocol: "mercury".into(),
            ddos: false,
            committee_size: 4,
            faults: 1,
            rate: 10_000,
            tx_size: 512,
            batch_size: 1_000,
            duration_s: 30.2,
            consensus_tps: 133.333,
            consensus_latency_ms: 1000.4,
            end_to_end_tps: Some(1_234_567.8),
            end_to_end_latency_ms: Some(2000.0),
        }
    }

    #[test]
    fn grouping_inserts_separators() {
        assert_eq!(group(0), "0");
        assert_eq!(group(999), "999");
        assert_eq!(group(1_000), "1,000");
        assert_eq!(group(1_234_567), "1,234,567");
        assert_eq!(group(-1_234), "-1,234");
    }

    #[test]
    fn rounding_ties_go_away_from_zero() {
        assert_eq!(rounded(0.5), "1");
        assert_eq!(rounded(1.5), "2");
        assert_eq!(rounded(2.5), "3");
        assert_eq!(rounded(-0.5), "-1");
        assert_eq!(rounded(1999.5), "2,000");
    }

    #[test]
    fn summary_has_fixed_layout() {
        let text = render_summary(&sample());
        let expected = "\n\
            -----------------------------------------\n \
            SUMMARY:\n\
            -----------------------------------------\n \
            + CONFIG:\n \
            Protocol: mercury \n \
            DDOS attack: false \n \
            Committee size: 4 nodes\n \
            Input rate: 10,000 tx/s\n \
            Transaction size: 512 B\n \
            Batch size: 1,000 tx/Batch\n \
            Faults: 1 nodes\n \
            Execution time: 30 s\n\
            \n \
            + RESULTS:\n \
            Consensus TPS: 133 tx/s\n \
            Consensus latency: 1,000 ms\n\
            \n \
            End-to-end TPS: 1,234,568 tx/s\n \
            End-to-end latency: 2,000 ms\n\
            -----------------------------------------\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn end_to_end_block_is_omitted_without_arrival_data() {
        let mut metrics = sample();
        metrics.end_to_end_tps = None;
        metrics.end_to_end_latency_ms = None;
        let text = render_summary(&metrics);
        assert!(!text.contains("End-to-end"));
        assert!(text.ends_with(" Consensus latency: 1,000 ms\n-----------------------------------------\n"));
    }

    #[test]
    fn zeroed_run_renders_without_panicking() {
        let metrics = BenchmarkMetrics {
            protocol: String::new(),
            ddos: false,
            committee_size: 0,
            faults: 0,
            rate: 0,
            tx_size: 0,
            batch_size: 0,
            duration_s: 0.0,
            consensus_tps: 0.0,
            consensus_latency_ms: 0.0,
            end_to_end_tps: Some(0.0),
            end_to_end_latency_ms: Some(0.0),
        };
        let text = render_summary(&metrics);
        assert!(text.contains(" Consensus TPS: 0 tx/s\n"));
        assert!(text.contains(" End-to-end latency: 0 ms\n"));
    }

    #[tokio::test]
    async fn append_accumulates_summaries() {
        let path = std::env::temp_dir().join(format!(
            "bench-analysis-report-{}-{}.txt",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let metrics = sample();
        append_summary(&path, &metrics).await.unwrap();
        append_summary(&path, &metrics).await.unwrap();
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.matches(" SUMMARY:").count(), 2);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
