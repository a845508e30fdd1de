//! Application use cases / business logic

pub mod aggregate;
pub mod classify;
pub mod ingest;
pub mod render;
pub mod report_job;
pub mod run_loop;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use aggregate::{DEFAULT_TOP_N, TitleTally, build_report};
pub use classify::{ClassifierConfig, RequestClassifier};
pub use ingest::{IngestConfig, Ingestor};
pub use render::{RenderConfig, ReportRenderer};
pub use report_job::{DailyReportJob, Delivery, ReportJobConfig, ReportJobError, ReportOutcome};
pub use run_loop::{PollSummary, RunLoop, RunLoopError};
pub use stats::collect_stats;
