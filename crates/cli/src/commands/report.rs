//! Report command - build, send and purge a report on demand

use anyhow::{Context, Result};
use reel_radar_domain::{
    DayWindow, MessageStore, PurgePolicy, SystemClock,
    usecases::{DailyReportJob, Delivery},
};
use std::path::PathBuf;
use std::sync::Arc;
use time::Date;
use time::macros::format_description;

use crate::args::ReportArgs;
use crate::commands::{build_messenger, open_store};
use crate::config::AppConfig;

pub async fn execute(args: ReportArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let dry_run = args.dry_run || config.general.dry_run;

    let mut job_config = config
        .report_job_config(dry_run)
        .context("Invalid report configuration")?;
    if args.no_purge {
        job_config.purge_policy = PurgePolicy::Never;
    }
    let zone = job_config.zone;

    let store = open_store(&config).await?;
    let messenger = build_messenger(&config, dry_run, args.outbox.clone()).await?;
    let job = DailyReportJob::new(Arc::clone(&store), messenger, Arc::new(SystemClock), job_config);

    let window = match args.date.as_deref() {
        Some(date) => DayWindow::for_date(parse_date(date)?, zone),
        None => job.current_window(),
    };

    tracing::info!(date = %window.date(), dry_run, "Running manual report");

    let result = job.run_for_window(window).await;
    store.close().await;
    let outcome = result.context("Report failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.text);
        println!();
        match &outcome.delivery {
            Delivery::Delivered { message_ids } => {
                println!("Delivered in {} message(s)", message_ids.len())
            }
            Delivery::NotConfigured => println!("Not delivered: no report channel configured"),
            Delivery::DryRun => println!("Dry run: nothing sent"),
            Delivery::Failed { sent, error } => {
                println!("Delivery failed after {} message(s): {}", sent, error)
            }
        }
        match outcome.purged {
            Some(count) => println!("Purged {} record(s)", count),
            None => println!("Records kept"),
        }
    }

    if let Delivery::Failed { error, .. } = &outcome.delivery {
        anyhow::bail!("Report delivery failed: {}", error);
    }

    Ok(())
}

fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}
