pub mod data_structures;
pub mod error;
pub mod extract;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod source;

pub use data_structures::{RunConfig, RunMeta};
pub use error::AnalysisError;
pub use metrics::BenchmarkMetrics;
pub use pipeline::LogAnalyzer;
pub use schema::LogSchema;
