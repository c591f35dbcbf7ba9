use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort the whole analysis. Conditions like an empty commit
/// table or no shared identifiers are not errors; they resolve to zero-valued
/// metrics instead (see `metrics`).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A node log contains a crash marker. A run with a crashed node has no
    /// meaningful throughput or latency, so no partial report is produced.
    #[error("node log contains a crash marker, run is unusable")]
    CrashDetected,

    /// A required one-time configuration line was not found in a node log
    /// (batch schema only; the height schema takes its config externally).
    #[error("missing required configuration line: {field}")]
    MissingConfigField { field: &'static str },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line matched an event pattern but its timestamp field did not parse
    /// in the schema's pinned format.
    #[error("unparseable timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("extraction worker failed")]
    Join(#[from] tokio::task::JoinError),
}
