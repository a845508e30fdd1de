//! Stats command - today's counters

use anyhow::{Context, Result};
use reel_radar_domain::{
    Clock, MessageStore, SystemClock,
    usecases::{ReportRenderer, collect_stats},
};
use std::path::PathBuf;

use crate::args::StatsArgs;
use crate::commands::open_store;
use crate::config::AppConfig;

pub async fn execute(args: StatsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let zone = config.zone()?;

    let store = open_store(&config).await?;
    let result = collect_stats(store.as_ref(), store.as_ref(), SystemClock.now(), zone).await;
    store.close().await;
    let stats = result.context("Failed to collect statistics")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        let renderer = ReportRenderer::new(config.render_config());
        println!("{}", renderer.render_stats(&stats));
    }

    Ok(())
}
