//! Run command - ingest loop plus the daily report schedule

use anyhow::{Context, Result};
use reel_radar_adapters::telegram::TelegramUpdateSource;
use reel_radar_domain::{
    Clock, IngestResult, Messenger, MessageStore, SystemClock,
    schedule::{DAILY_REPORT_JOB_ID, DailySchedule},
    usecases::{DailyReportJob, Ingestor, PollSummary, RequestClassifier, RunLoop},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::args::RunArgs;
use crate::commands::{build_messenger, load_bot_token, open_store};
use crate::config::AppConfig;

/// Pause after a failed poll before asking Telegram again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

type ReportJob = DailyReportJob<dyn MessageStore, dyn Messenger, SystemClock>;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let dry_run = args.dry_run || config.general.dry_run;
    let schedule = config.schedule()?;

    tracing::info!(
        dry_run = dry_run,
        once = args.once,
        outbox = ?args.outbox,
        report_at = %schedule.time_of_day(),
        zone = %schedule.zone(),
        channel_id = ?config.report.channel_id,
        "Starting reel-radar run"
    );

    if config.report.channel_id.is_none() {
        tracing::warn!("report.channel_id is not set, reports will not be delivered");
    }

    // Build dependencies
    let store = open_store(&config).await?;
    let bot_token = load_bot_token(&config.telegram.bot_token_env)?;
    let updates = Arc::new(TelegramUpdateSource::with_base_url(
        bot_token,
        config.telegram.base_url.clone(),
        if args.once {
            0
        } else {
            config.telegram.poll_timeout_secs
        },
    ));
    let messenger = build_messenger(&config, dry_run, args.outbox.clone()).await?;
    let clock = Arc::new(SystemClock);

    let ingestor = Ingestor::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&clock),
        RequestClassifier::new(config.classifier_config()),
        config.ingest_config(),
    );
    let run_loop = RunLoop::new(updates, ingestor);

    let report_store: Arc<dyn MessageStore> = store.clone();
    let report_job: Arc<ReportJob> = Arc::new(DailyReportJob::new(
        report_store,
        messenger,
        Arc::clone(&clock),
        config
            .report_job_config(dry_run)
            .context("Invalid report configuration")?,
    ));

    if args.once {
        tracing::info!("Running single poll cycle");
        let results = run_loop.poll_once().await?;
        log_results(&results);
        store.close().await;
        tracing::info!("reel-radar run completed");
        return Ok(());
    }

    let scheduler = tokio::spawn(schedule_reports(
        Arc::clone(&report_job),
        schedule,
        Arc::clone(&clock),
    ));

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
            result = run_loop.poll_once() => {
                match result {
                    Ok(results) => log_results(&results),
                    Err(e) => {
                        tracing::error!(error = %e, "Poll cycle failed");
                        sleep(POLL_ERROR_BACKOFF).await;
                    }
                }
            }
        }
    }

    scheduler.abort();
    store.close().await;
    tracing::info!("reel-radar run completed");
    Ok(())
}

/// Sleep until each scheduled instant and fire the report job without
/// waiting for it, so a slow delivery never delays ingestion.
async fn schedule_reports(job: Arc<ReportJob>, schedule: DailySchedule, clock: Arc<SystemClock>) {
    loop {
        let now = clock.now();
        let next = schedule.next_after(now);
        tracing::info!(job_id = DAILY_REPORT_JOB_ID, next_run = %next, "Scheduled daily report");

        sleep(schedule.until_next(now)).await;

        let job = Arc::clone(&job);
        tokio::spawn(async move {
            tracing::info!(job_id = DAILY_REPORT_JOB_ID, "Running daily report");
            match job.run().await {
                Ok(outcome) => tracing::info!(
                    job_id = DAILY_REPORT_JOB_ID,
                    delivery = ?outcome.delivery,
                    purged = ?outcome.purged,
                    "Daily report finished"
                ),
                Err(e) => tracing::error!(
                    job_id = DAILY_REPORT_JOB_ID,
                    error = %e,
                    "Daily report failed"
                ),
            }
        });
    }
}

fn log_results(results: &[(i64, IngestResult)]) {
    for (message_id, result) in results {
        match result {
            IngestResult::Stored { is_request, .. } => {
                tracing::debug!(message_id, is_request, "Stored");
            }
            IngestResult::Skipped { reason } => {
                tracing::debug!(message_id, reason = %reason, "Skipped");
            }
            IngestResult::Failed { error } => {
                tracing::error!(message_id, error = %error, "Failed");
            }
        }
    }

    let summary = PollSummary::from_results(results);
    if summary.fetched > 0 {
        tracing::info!(
            stored = summary.stored,
            requests = summary.requests,
            "Processed messages"
        );
    }
}
