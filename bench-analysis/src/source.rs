use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::info;

use crate::data_structures::RunMeta;
use crate::error::AnalysisError;
use crate::schema::LogSchema;

/// Lists the per-node log files in `dir` for the given schema, sorted by
/// filename. The sort is for determinism when debugging; the merge itself
/// is order-insensitive.
pub fn discover_logs(dir: &Path, schema: LogSchema) -> Result<Vec<PathBuf>, AnalysisError> {
    let io_err = |source| AnalysisError::Io { path: dir.to_path_buf(), source };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(schema.log_prefix()) && name.ends_with(".log") {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Collaborator seam for the benchmark-run driver: something that hands the
/// pipeline the raw per-node log texts and the run metadata. The core never
/// fetches logs itself; provisioning and download happen upstream.
#[async_trait]
pub trait LogProvider: Send + Sync {
    /// Raw log texts in sorted filename order.
    async fn load_logs(&self) -> Result<Vec<String>, AnalysisError>;

    fn run_meta(&self) -> &RunMeta;

    fn schema(&self) -> LogSchema;
}

/// The standard provider: a directory of already-downloaded log files.
pub struct DirectoryLogs {
    pub dir: PathBuf,
    pub schema: LogSchema,
    pub meta: RunMeta,
}

#[async_trait]
impl LogProvider for DirectoryLogs {
    async fn load_logs(&self) -> Result<Vec<String>, AnalysisError> {
        let paths = discover_logs(&self.dir, self.schema)?;
        info!("found {} node logs in {}", paths.len(), self.dir.display());
        let mut texts = Vec::with_capacity(paths.len());
        for path in paths {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| AnalysisError::Io { path: path.clone(), source })?;
            texts.push(text);
        }
        Ok(texts)
    }

    fn run_meta(&self) -> &RunMeta {
        &self.meta
    }

    fn schema(&self) -> LogSchema {
        self.schema
    }
}
