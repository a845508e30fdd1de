//! Run loop use case - pulls updates from the transport and ingests them

use std::sync::Arc;

use crate::{
    model::IngestResult,
    ports::{ChatRegistry, Clock, MessageStore, UpdateSource},
    usecases::ingest::Ingestor,
};

/// Counters for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub fetched: usize,
    pub stored: usize,
    pub requests: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PollSummary {
    pub fn from_results(results: &[(i64, IngestResult)]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, (_, result)| {
                summary.fetched += 1;
                match result {
                    IngestResult::Stored { is_request, .. } => {
                        summary.stored += 1;
                        if *is_request {
                            summary.requests += 1;
                        }
                    }
                    IngestResult::Skipped { .. } => summary.skipped += 1,
                    IngestResult::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }
}

/// Ingestion orchestrator
pub struct RunLoop<U, St, Ch, Cl>
where
    U: UpdateSource + ?Sized,
    St: MessageStore + ?Sized,
    Ch: ChatRegistry + ?Sized,
    Cl: Clock + ?Sized,
{
    updates: Arc<U>,
    ingestor: Ingestor<St, Ch, Cl>,
}

impl<U, St, Ch, Cl> RunLoop<U, St, Ch, Cl>
where
    U: UpdateSource + ?Sized,
    St: MessageStore + ?Sized,
    Ch: ChatRegistry + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(updates: Arc<U>, ingestor: Ingestor<St, Ch, Cl>) -> Self {
        Self { updates, ingestor }
    }

    /// Fetch one batch of updates and ingest it in arrival order
    pub async fn poll_once(&self) -> Result<Vec<(i64, IngestResult)>, RunLoopError> {
        let messages = self
            .updates
            .fetch_updates()
            .await
            .map_err(|e| RunLoopError::Updates(e.to_string()))?;

        if messages.is_empty() {
            tracing::debug!("No new messages");
            return Ok(vec![]);
        }

        tracing::debug!(count = messages.len(), "Fetched messages");

        let results = self.ingestor.ingest_batch(messages).await;
        let summary = PollSummary::from_results(&results);

        tracing::info!(
            fetched = summary.fetched,
            stored = summary.stored,
            requests = summary.requests,
            skipped = summary.skipped,
            failed = summary.failed,
            "Poll cycle complete"
        );

        Ok(results)
    }
}

/// Errors from the run loop
#[derive(Debug, thiserror::Error)]
pub enum RunLoopError {
    #[error("Update source error: {0}")]
    Updates(String),
}
