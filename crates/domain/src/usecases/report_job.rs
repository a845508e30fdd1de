//! Daily report job - aggregate, deliver, then purge one day of requests

use std::sync::Arc;

use serde::Serialize;

use crate::{
    model::{
        DailyReport, DayWindow, OutboundMessage, PurgePolicy, PurgeScope, RecordFilter, ReportDay,
    },
    ports::{Clock, MessageStore, Messenger, StoreError},
    usecases::{
        aggregate::{DEFAULT_TOP_N, build_report},
        render::{RenderConfig, ReportRenderer},
    },
    zone::Zone,
};

/// Configuration for the report job
#[derive(Debug, Clone)]
pub struct ReportJobConfig {
    /// Zone used to compute day windows (must match ingestion)
    pub zone: Zone,
    /// Which day a run covers
    pub report_day: ReportDay,
    pub purge_policy: PurgePolicy,
    pub purge_scope: PurgeScope,
    /// Chat or channel receiving the report
    pub channel_id: Option<i64>,
    /// Build and log the report without delivering or purging
    pub dry_run: bool,
    /// Number of titles in the ranked list
    pub top_n: usize,
    pub render_config: RenderConfig,
}

impl Default for ReportJobConfig {
    fn default() -> Self {
        Self {
            zone: Zone::UTC,
            report_day: ReportDay::Previous,
            purge_policy: PurgePolicy::OnDelivery,
            purge_scope: PurgeScope::ReportInput,
            channel_id: None,
            dry_run: false,
            top_n: DEFAULT_TOP_N,
            render_config: RenderConfig::default(),
        }
    }
}

/// What happened to the rendered report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    /// Every part was sent; platform message IDs in order
    Delivered { message_ids: Vec<String> },
    /// No channel configured or the messenger is disabled
    NotConfigured,
    /// Dry run, nothing sent
    DryRun,
    /// Sending failed after `sent` parts went out
    Failed { sent: usize, error: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }
}

/// Result of one report run
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub report: DailyReport,
    /// Full rendered text
    pub text: String,
    pub delivery: Delivery,
    /// Records deleted, None if the purge was skipped
    pub purged: Option<u64>,
}

/// Errors that abort a report run
#[derive(Debug, thiserror::Error)]
pub enum ReportJobError {
    #[error("Failed to read report input: {0}")]
    Read(StoreError),
    #[error("Failed to purge reported records: {0}")]
    Purge(StoreError),
}

/// Builds, sends and purges the report for one day window
pub struct DailyReportJob<St, M, Cl>
where
    St: MessageStore + ?Sized,
    M: Messenger + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    messenger: Arc<M>,
    clock: Arc<Cl>,
    config: ReportJobConfig,
    renderer: ReportRenderer,
}

impl<St, M, Cl> DailyReportJob<St, M, Cl>
where
    St: MessageStore + ?Sized,
    M: Messenger + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(store: Arc<St>, messenger: Arc<M>, clock: Arc<Cl>, config: ReportJobConfig) -> Self {
        let renderer = ReportRenderer::new(config.render_config.clone());
        Self {
            store,
            messenger,
            clock,
            config,
            renderer,
        }
    }

    pub fn config(&self) -> &ReportJobConfig {
        &self.config
    }

    /// The window a run started now would cover
    pub fn current_window(&self) -> DayWindow {
        let today = DayWindow::containing(self.clock.now(), self.config.zone);
        match self.config.report_day {
            ReportDay::Current => today,
            ReportDay::Previous => today.previous(self.config.zone),
        }
    }

    /// Run for the configured day. The window is fixed once, here, and used
    /// for both the read and the purge.
    pub async fn run(&self) -> Result<ReportOutcome, ReportJobError> {
        self.run_for_window(self.current_window()).await
    }

    /// Run for an explicit window
    pub async fn run_for_window(&self, window: DayWindow) -> Result<ReportOutcome, ReportJobError> {
        let input_filter = RecordFilter::requests_in(window);

        let records = self
            .store
            .find_records(&input_filter)
            .await
            .map_err(ReportJobError::Read)?;

        let report = build_report(window, &records, self.config.top_n);
        let text = self.renderer.render_report(&report);

        tracing::info!(
            date = %window.date(),
            records = report.window_record_count,
            total_requests = report.total_extracted_requests,
            unique_titles = report.unique_title_count,
            "Generated daily report"
        );

        if self.config.dry_run {
            tracing::info!(report = %text, "[DRY RUN] Would send report");
            return Ok(ReportOutcome {
                report,
                text,
                delivery: Delivery::DryRun,
                purged: None,
            });
        }

        let delivery = self.deliver(&report).await;

        let should_purge = match self.config.purge_policy {
            PurgePolicy::Always => true,
            PurgePolicy::OnDelivery => delivery.is_delivered(),
            PurgePolicy::Never => false,
        };

        let purged = if should_purge {
            let purge_filter = match self.config.purge_scope {
                PurgeScope::ReportInput => input_filter,
                PurgeScope::Window => RecordFilter::all_in(window),
            };
            let deleted = self
                .store
                .delete_records(&purge_filter)
                .await
                .map_err(ReportJobError::Purge)?;
            tracing::info!(date = %window.date(), deleted, "Cleared reported messages");
            Some(deleted)
        } else {
            tracing::warn!(
                date = %window.date(),
                policy = ?self.config.purge_policy,
                delivery = ?delivery,
                "Keeping report input, purge skipped"
            );
            None
        };

        Ok(ReportOutcome {
            report,
            text,
            delivery,
            purged,
        })
    }

    async fn deliver(&self, report: &DailyReport) -> Delivery {
        let Some(channel_id) = self.config.channel_id else {
            tracing::warn!("No report channel configured");
            return Delivery::NotConfigured;
        };

        if !self.messenger.is_enabled() {
            tracing::warn!(platform = self.messenger.platform(), "Messenger disabled");
            return Delivery::NotConfigured;
        }

        let mut message_ids = Vec::new();
        for chunk in self.renderer.render_report_chunks(report) {
            let message = OutboundMessage::to_chat(channel_id, chunk);
            match self.messenger.send(&message).await {
                Ok(sent) => message_ids.push(sent.id),
                Err(e) => {
                    tracing::error!(
                        channel_id,
                        platform = self.messenger.platform(),
                        sent = message_ids.len(),
                        error = %e,
                        "Failed to send report"
                    );
                    return Delivery::Failed {
                        sent: message_ids.len(),
                        error: e.to_string(),
                    };
                }
            }
        }

        tracing::info!(
            channel_id,
            platform = self.messenger.platform(),
            parts = message_ids.len(),
            "Daily report sent"
        );
        Delivery::Delivered { message_ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageRecord;
    use crate::usecases::test_support::{FakeClock, FakeMessenger, FakeStore};
    use crate::zone::parse_timezone;
    use time::OffsetDateTime;
    use time::macros::{datetime, offset};
    use uuid::Uuid;

    const CHANNEL: i64 = -1001234567890;

    fn record(titles: &[&str], timestamp: OffsetDateTime) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            chat_id: -100,
            chat_title: None,
            user_id: Some(1),
            username: None,
            text: titles.join(", "),
            timestamp,
            is_movie_request: !titles.is_empty(),
            extracted_titles: titles.iter().map(|t| t.to_string()).collect(),
            message_id: 1,
        }
    }

    fn seeded_store() -> Arc<FakeStore> {
        let store = FakeStore::default();
        {
            let mut records = store.records.lock().unwrap();
            records.push(record(&["kgf", "rrr"], datetime!(2024-05-10 01:00 UTC)));
            records.push(record(&["kgf"], datetime!(2024-05-10 03:00 UTC)));
            records.push(record(&[], datetime!(2024-05-10 04:00 UTC)));
            records.push(record(&["leo"], datetime!(2024-05-09 22:00 UTC)));
        }
        Arc::new(store)
    }

    /// Job firing at 06:00 UTC on the 11th, covering the 10th by default
    fn job(
        store: Arc<FakeStore>,
        messenger: Arc<FakeMessenger>,
        config: ReportJobConfig,
    ) -> DailyReportJob<FakeStore, FakeMessenger, FakeClock> {
        job_at(store, messenger, config, datetime!(2024-05-11 06:00 UTC))
    }

    fn job_at(
        store: Arc<FakeStore>,
        messenger: Arc<FakeMessenger>,
        config: ReportJobConfig,
        time: OffsetDateTime,
    ) -> DailyReportJob<FakeStore, FakeMessenger, FakeClock> {
        DailyReportJob::new(store, messenger, Arc::new(FakeClock { time }), config)
    }

    fn config() -> ReportJobConfig {
        ReportJobConfig {
            channel_id: Some(CHANNEL),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reports_sends_and_purges_exactly_the_input() {
        let store = seeded_store();
        let messenger = Arc::new(FakeMessenger::default());
        let job = job(Arc::clone(&store), Arc::clone(&messenger), config());

        let outcome = job.run().await.unwrap();

        assert_eq!(outcome.report.window_record_count, 2);
        assert_eq!(outcome.report.ranked[0].title, "Kgf");
        assert_eq!(outcome.report.ranked[0].count, 2);
        assert!(outcome.delivery.is_delivered());
        assert_eq!(outcome.purged, Some(2));

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, CHANNEL);
        assert!(sent[0].text.contains("1. Kgf (2 requests)"));

        // The non-request of the same day and the other day's request survive
        let window = job.current_window();
        let remaining = store.records.lock().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(
            !remaining
                .iter()
                .any(|r| RecordFilter::requests_in(window).matches(r))
        );
    }

    #[tokio::test]
    async fn test_window_scope_purges_whole_day() {
        let store = seeded_store();
        let job = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::default()),
            ReportJobConfig {
                purge_scope: PurgeScope::Window,
                ..config()
            },
        );

        let outcome = job.run().await.unwrap();
        assert_eq!(outcome.purged, Some(3));
        assert_eq!(store.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_records_by_default() {
        let store = seeded_store();
        let job = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::failing()),
            config(),
        );

        let outcome = job.run().await.unwrap();
        assert!(matches!(outcome.delivery, Delivery::Failed { sent: 0, .. }));
        assert_eq!(outcome.purged, None);
        assert_eq!(store.records.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_always_policy_purges_after_failed_delivery() {
        let store = seeded_store();
        let job = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::failing()),
            ReportJobConfig {
                purge_policy: PurgePolicy::Always,
                ..config()
            },
        );

        let outcome = job.run().await.unwrap();
        assert!(!outcome.delivery.is_delivered());
        assert_eq!(outcome.purged, Some(2));
    }

    #[tokio::test]
    async fn test_partial_delivery_counts_as_failure() {
        let store = seeded_store();
        let messenger = Arc::new(FakeMessenger {
            fail_after: Some(1),
            ..Default::default()
        });
        let job = job(
            Arc::clone(&store),
            Arc::clone(&messenger),
            ReportJobConfig {
                render_config: RenderConfig {
                    max_message_chars: 40,
                    footer: None,
                },
                ..config()
            },
        );

        let outcome = job.run().await.unwrap();
        assert!(matches!(outcome.delivery, Delivery::Failed { sent: 1, .. }));
        assert_eq!(outcome.purged, None);
    }

    #[tokio::test]
    async fn test_no_channel_is_not_delivered() {
        let store = seeded_store();
        let job = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::default()),
            ReportJobConfig::default(),
        );

        let outcome = job.run().await.unwrap();
        assert_eq!(outcome.delivery, Delivery::NotConfigured);
        assert_eq!(outcome.purged, None);
    }

    #[tokio::test]
    async fn test_dry_run_neither_sends_nor_purges() {
        let store = seeded_store();
        let messenger = Arc::new(FakeMessenger::default());
        let job = job(
            Arc::clone(&store),
            Arc::clone(&messenger),
            ReportJobConfig {
                dry_run: true,
                ..config()
            },
        );

        let outcome = job.run().await.unwrap();
        assert_eq!(outcome.delivery, Delivery::DryRun);
        assert!(messenger.sent.lock().unwrap().is_empty());
        assert_eq!(store.records.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_day_still_reports() {
        let store = Arc::new(FakeStore::default());
        let messenger = Arc::new(FakeMessenger::default());
        let job = job(Arc::clone(&store), Arc::clone(&messenger), config());

        let outcome = job.run().await.unwrap();
        assert!(outcome.report.is_empty());
        assert_eq!(outcome.purged, Some(0));
        assert!(
            messenger.sent.lock().unwrap()[0]
                .text
                .contains("No movie requests found for 10-05-2024!")
        );
    }

    #[tokio::test]
    async fn test_report_day_and_offset() {
        let store = seeded_store();
        let zone = Zone::Fixed(offset!(+5:30));

        // 06:00 UTC on the 11th is 11:30 local, so the current day is the
        // 11th and the previous one is [2024-05-09 18:30 UTC, 2024-05-10 18:30 UTC)
        let current = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::default()),
            ReportJobConfig {
                report_day: ReportDay::Current,
                zone,
                dry_run: true,
                ..config()
            },
        );
        assert_eq!(current.current_window().start, datetime!(2024-05-11 00:00 +5:30));
        assert_eq!(current.run().await.unwrap().report.window_record_count, 0);

        let previous = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::default()),
            ReportJobConfig {
                zone,
                dry_run: true,
                ..config()
            },
        );
        assert_eq!(previous.current_window().start, datetime!(2024-05-10 00:00 +5:30));
        // leo at 2024-05-09 22:00 UTC is already the 10th locally
        assert_eq!(previous.run().await.unwrap().report.window_record_count, 3);
    }

    #[tokio::test]
    async fn test_request_after_fire_time_is_reported_next_run() {
        let store = Arc::new(FakeStore::default());
        let messenger = Arc::new(FakeMessenger::default());

        let first = job_at(
            Arc::clone(&store),
            Arc::clone(&messenger),
            config(),
            datetime!(2024-05-10 06:00 UTC),
        );
        assert!(first.run().await.unwrap().report.is_empty());

        store
            .records
            .lock()
            .unwrap()
            .push(record(&["kgf"], datetime!(2024-05-10 10:00 UTC)));

        let second = job_at(
            Arc::clone(&store),
            Arc::clone(&messenger),
            config(),
            datetime!(2024-05-11 06:00 UTC),
        );
        let outcome = second.run().await.unwrap();
        assert_eq!(outcome.report.window_record_count, 1);
        assert_eq!(outcome.report.ranked[0].title, "Kgf");
        assert_eq!(outcome.purged, Some(1));
        assert!(store.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_named_zone_window() {
        let store = seeded_store();
        let job = job(
            Arc::clone(&store),
            Arc::new(FakeMessenger::default()),
            ReportJobConfig {
                zone: parse_timezone("America/New_York").unwrap(),
                dry_run: true,
                ..config()
            },
        );

        // The 10th in New York (EDT) is [04:00 UTC on the 10th, 04:00 UTC on the 11th)
        let window = job.current_window();
        assert_eq!(window.start, datetime!(2024-05-10 04:00 UTC));
        assert_eq!(window.end, datetime!(2024-05-11 04:00 UTC));
    }

    #[tokio::test]
    async fn test_read_failure_is_an_error() {
        let store = Arc::new(FakeStore {
            fail_reads: true,
            ..Default::default()
        });
        let job = job(store, Arc::new(FakeMessenger::default()), config());

        let result = job.run().await;
        assert!(matches!(result, Err(ReportJobError::Read(_))));
    }
}
