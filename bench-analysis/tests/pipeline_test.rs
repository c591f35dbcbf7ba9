// End-to-end runs over real log files in a scratch directory, covering both
// schemas, the crash-abort path, and report rendering.

use std::path::PathBuf;

use bench_analysis::report;
use bench_analysis::{AnalysisError, LogAnalyzer, LogSchema, RunConfig, RunMeta};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "bench-analysis-it-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const NODE_A: &str = concat!(
    "[INFO] 2024/01/01 00:00:00.000000 consensus.go:31: Consensus DDos: false, Faults: 1 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:131: Transaction pool tx size set to 512 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:135: Transaction pool batch size set to 100 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:139: Transaction pool tx rate set to 1000 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:64: Received Batch 1\n",
    "[INFO] 2024/01/01 00:00:01.000000 core.go:188: create Block epoch 0 node 0 batch_id 1 \n",
    "[INFO] 2024/01/01 00:00:02.000000 commitor.go:28: commit Block epoch 0 node 0 batch_id 1 \n",
);

const NODE_B: &str = concat!(
    "[INFO] 2024/01/01 00:00:00.000000 consensus.go:31: Consensus DDos: false, Faults: 1 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:131: Transaction pool tx size set to 512 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:135: Transaction pool batch size set to 100 \n",
    "[INFO] 2024/01/01 00:00:00.000000 pool.go:139: Transaction pool tx rate set to 1000 \n",
    "[INFO] 2024/01/01 00:00:00.500000 pool.go:64: Received Batch 2\n",
    "[INFO] 2024/01/01 00:00:01.500000 core.go:188: create Block epoch 0 node 1 batch_id 2 \n",
    "[INFO] 2024/01/01 00:00:02.500000 commitor.go:28: commit Block epoch 0 node 1 batch_id 2 \n",
);

#[tokio::test]
async fn batch_schema_end_to_end() {
    let dir = scratch_dir("batch");
    std::fs::write(dir.join("node-info-0.log"), NODE_A).unwrap();
    std::fs::write(dir.join("node-info-1.log"), NODE_B).unwrap();
    // Unrelated files in the run directory are not picked up.
    std::fs::write(dir.join("client-0.log"), "panic: client crash\n").unwrap();

    let analyzer = LogAnalyzer::new(LogSchema::Batch, RunMeta::new("mercury", false, 1));
    let metrics = analyzer.process_dir(&dir).await.unwrap();

    assert_eq!(metrics.committee_size, 2);
    assert_eq!(metrics.tx_size, 512);
    assert_eq!(metrics.batch_size, 100);
    assert_eq!(metrics.rate, 1000);
    assert_eq!(metrics.faults, 1);

    // Duration from first proposal (t+1.0) to last commit (t+2.5).
    assert!((metrics.consensus_tps - 2.0 * 100.0 / 1.5).abs() < 1e-6);
    assert!((metrics.consensus_latency_ms - 1000.0).abs() < 1e-6);
    // End-to-end anchors at the first batch arrival (t+0.0).
    assert!((metrics.end_to_end_tps.unwrap() - 2.0 * 100.0 / 2.5).abs() < 1e-6);
    assert!((metrics.end_to_end_latency_ms.unwrap() - 2000.0).abs() < 1e-6);
    assert!((metrics.duration_s - 2.5).abs() < 1e-9);

    let summary = report::render_summary(&metrics);
    assert!(summary.contains(" Consensus TPS: 133 tx/s\n"));
    assert!(summary.contains(" End-to-end TPS: 80 tx/s\n"));
    assert!(summary.contains(" Committee size: 2 nodes\n"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn crashed_node_aborts_the_run() {
    let dir = scratch_dir("crash");
    std::fs::write(dir.join("node-info-0.log"), NODE_A).unwrap();
    std::fs::write(
        dir.join("node-info-1.log"),
        format!("{NODE_B}panic: runtime error: invalid memory address\n"),
    )
    .unwrap();

    let analyzer = LogAnalyzer::new(LogSchema::Batch, RunMeta::new("mercury", false, 1));
    let result = analyzer.process_dir(&dir).await;
    assert!(matches!(result, Err(AnalysisError::CrashDetected)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn height_schema_end_to_end() {
    let dir = scratch_dir("height");
    std::fs::write(
        dir.join("node-0.log"),
        concat!(
            "2024-01-01T00:00:00.000000Z [node 0] broadcast a new proposal and proof: height=1\n",
            "2024-01-01T00:00:01.000000Z [node 0] commit the block: block_index=1 txs=500\n",
            "2024-01-01T00:00:02.000000Z [node 0] broadcast a new proposal and proof: height=2\n",
            "2024-01-01T00:00:03.000000Z [node 0] commit the block: block_index=2 txs=500\n",
        ),
    )
    .unwrap();
    std::fs::write(
        dir.join("node-1.log"),
        concat!(
            // Same heights observed later on this replica; keep-earliest
            // makes the node-0 timestamps win.
            "2024-01-01T00:00:00.800000Z [node 1] broadcast a new proposal and proof: height=1\n",
            "2024-01-01T00:00:01.800000Z [node 1] commit the block: block_index=1 txs=500\n",
        ),
    )
    .unwrap();

    let mut meta = RunMeta::new("hotstuff", false, 0);
    meta.default_config = Some(RunConfig {
        tx_size: 256,
        batch_size: 500,
        rate: 5000,
        faults: 0,
    });
    let analyzer = LogAnalyzer::new(LogSchema::Height, meta);
    let metrics = analyzer.process_dir(&dir).await.unwrap();

    assert_eq!(metrics.committee_size, 2);
    assert_eq!(metrics.batch_size, 500);
    // Keep-earliest: proposals {1: t+0, 2: t+2}, commits {1: t+1, 2: t+3}.
    assert!((metrics.consensus_tps - 2.0 * 500.0 / 3.0).abs() < 1e-6);
    assert!((metrics.consensus_latency_ms - 1000.0).abs() < 1e-6);
    assert_eq!(metrics.end_to_end_tps, None);
    assert_eq!(metrics.end_to_end_latency_ms, None);

    let summary = report::render_summary(&metrics);
    assert!(!summary.contains("End-to-end"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn missing_config_line_fails_the_parse() {
    let dir = scratch_dir("missing-config");
    // A log with events but no "Transaction pool ..." lines.
    std::fs::write(
        dir.join("node-info-0.log"),
        "[INFO] 2024/01/01 00:00:01.000000 core.go:188: create Block epoch 0 node 0 batch_id 1 \n",
    )
    .unwrap();

    let analyzer = LogAnalyzer::new(LogSchema::Batch, RunMeta::new("mercury", false, 0));
    let result = analyzer.process_dir(&dir).await;
    assert!(matches!(
        result,
        Err(AnalysisError::MissingConfigField { .. })
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn summary_appends_to_results_file() {
    let dir = scratch_dir("append");
    std::fs::write(dir.join("node-info-0.log"), NODE_A).unwrap();

    let analyzer = LogAnalyzer::new(LogSchema::Batch, RunMeta::new("mercury", true, 1));
    let metrics = analyzer.process_dir(&dir).await.unwrap();

    let out = dir.join("results.txt");
    report::append_summary(&out, &metrics).await.unwrap();
    report::append_summary(&out, &metrics).await.unwrap();
    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(contents.matches(" SUMMARY:").count(), 2);
    assert!(contents.contains(" DDOS attack: true \n"));

    // The structured value round-trips for programmatic consumers.
    let json = serde_json::to_string(&metrics).unwrap();
    let back: bench_analysis::BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back, metrics);

    std::fs::remove_dir_all(&dir).unwrap();
}
