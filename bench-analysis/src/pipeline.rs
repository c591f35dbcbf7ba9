use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::data_structures::{MergedResult, NodeParseResult, RunMeta};
use crate::error::AnalysisError;
use crate::extract;
use crate::merge;
use crate::metrics::BenchmarkMetrics;
use crate::schema::LogSchema;
use crate::source::{DirectoryLogs, LogProvider};

/// The whole pipeline: load logs, extract each node's tables on a bounded
/// worker pool, fold them into one `MergedResult`, compute metrics.
///
/// Extraction is embarrassingly parallel (each worker owns its text and
/// shares nothing), so the pool is sized to the host's parallelism. The
/// first extraction failure aborts the remaining workers; a partial result
/// has no meaningful throughput or latency.
pub struct LogAnalyzer {
    schema: LogSchema,
    meta: RunMeta,
}

impl LogAnalyzer {
    pub fn new(schema: LogSchema, meta: RunMeta) -> Self {
        LogAnalyzer { schema, meta }
    }

    /// Analyzes a directory of downloaded per-node log files.
    pub async fn process_dir(&self, dir: impl Into<PathBuf>) -> Result<BenchmarkMetrics, AnalysisError> {
        let provider = DirectoryLogs {
            dir: dir.into(),
            schema: self.schema,
            meta: self.meta.clone(),
        };
        Self::process(&provider).await
    }

    /// Analyzes logs supplied by an arbitrary provider (e.g. a remote
    /// driver that already holds the texts in memory). The provider's
    /// schema and run metadata are authoritative.
    pub async fn process(provider: &dyn LogProvider) -> Result<BenchmarkMetrics, AnalysisError> {
        let analyzer = LogAnalyzer::new(provider.schema(), provider.run_meta().clone());
        let texts = provider.load_logs().await?;
        analyzer.process_texts(texts).await
    }

    /// Core entry point: raw texts in sorted filename order.
    pub async fn process_texts(&self, texts: Vec<String>) -> Result<BenchmarkMetrics, AnalysisError> {
        let committee_size = texts.len();
        info!(
            "parsing {} node logs ({:?} schema, protocol {})",
            committee_size, self.schema, self.meta.protocol
        );

        let results = self.extract_all(texts).await?;
        let merged = self.fold(results, committee_size);
        debug!(
            "merged tables: {} arrivals, {} proposals, {} commits",
            merged.batch_arrivals.len(),
            merged.proposals.len(),
            merged.commits.len()
        );

        Ok(BenchmarkMetrics::compute(&merged, &self.meta))
    }

    /// Runs `extract::parse_node` for every text on a semaphore-bounded set
    /// of blocking workers. Results come back in input order regardless of
    /// completion order, so the representative config stays the first
    /// node's.
    async fn extract_all(&self, texts: Vec<String>) -> Result<Vec<NodeParseResult>, AnalysisError> {
        let parallelism = std::thread::available_parallelism().map_or(1, |n| n.get());
        let semaphore = Arc::new(Semaphore::new(parallelism));
        let schema = self.schema;

        let mut workers = JoinSet::new();
        for (index, text) in texts.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                let parsed = tokio::task::spawn_blocking(move || extract::parse_node(&text, schema))
                    .await?;
                Ok::<_, AnalysisError>((index, parsed?))
            });
        }

        let mut results: Vec<Option<NodeParseResult>> =
            std::iter::repeat_with(|| None).take(workers.len()).collect();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok((index, parsed))) => results[index] = Some(parsed),
                Ok(Err(err)) => {
                    workers.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    workers.abort_all();
                    return Err(join_err.into());
                }
            }
        }

        Ok(results
            .into_iter()
            .map(|slot| slot.expect("every worker reported exactly once"))
            .collect())
    }

    /// Sequential fold of the per-node tables. The keep rule is pairwise
    /// commutative, so the fold order cannot change the outcome.
    fn fold(&self, results: Vec<NodeParseResult>, committee_size: usize) -> MergedResult {
        let keep = self.schema.keep_rule();
        let mut merged = MergedResult {
            schema: self.schema,
            batch_arrivals: Default::default(),
            proposals: Default::default(),
            commits: Default::default(),
            config: Default::default(),
            committee_size,
        };

        let mut config = None;
        for node in results {
            merge::fold_into(&mut merged.batch_arrivals, node.batch_arrivals, keep);
            merge::fold_into(&mut merged.proposals, node.proposals, keep);
            merge::fold_into(&mut merged.commits, node.commits, keep);
            if config.is_none() {
                config = node.config;
            }
        }

        // Batch schema: the first node's snapshot (extraction guarantees it
        // exists). Height schema: the externally supplied defaults.
        merged.config = match self.schema {
            LogSchema::Batch => config.unwrap_or_default(),
            LogSchema::Height => self.meta.default_config.clone().unwrap_or_default(),
        };
        merged
    }
}
