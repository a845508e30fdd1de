//! Doctor command - validate configuration and show status

use anyhow::Result;
use reel_radar_adapters::{store::SqliteRecordStore, telegram::TelegramMessenger};
use reel_radar_domain::{ChatRegistry, MessageStore, RecordFilter};
use serde::Serialize;
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::args::DoctorArgs;
use crate::commands::load_bot_token;
use crate::config::AppConfig;

const COMPONENTS: &[&str] = &["config", "store", "schedule", "telegram", "report"];

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    store: CheckResult,
    schedule: CheckResult,
    telegram: CheckResult,
    report: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn skipped() -> Self {
        Self {
            status: "skipped".to_string(),
            message: "Not checked".to_string(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_warn(&self) -> bool {
        self.status == "warn"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    if let Some(ref component) = args.check {
        if !COMPONENTS.contains(&component.as_str()) {
            anyhow::bail!(
                "Unknown component '{}', expected one of: {}",
                component,
                COMPONENTS.join(", ")
            );
        }
    }
    let wants = |name: &str| args.check.as_deref().is_none_or(|c| c == name);

    let mut report = DoctorReport {
        config: CheckResult::skipped(),
        store: CheckResult::skipped(),
        schedule: CheckResult::skipped(),
        telegram: CheckResult::skipped(),
        report: CheckResult::skipped(),
        overall: "error".to_string(),
    };

    // The config is needed by every other check
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        if wants("store") {
            report.store = check_store(config).await;
        }
        if wants("schedule") {
            report.schedule = check_schedule(config);
        }
        if wants("telegram") {
            report.telegram = check_telegram(config).await;
        }
        if wants("report") {
            report.report = check_report(config);
        }
    }

    let checks = [
        &report.config,
        &report.store,
        &report.schedule,
        &report.telegram,
        &report.report,
    ];

    report.overall = if checks.iter().any(|c| c.is_error()) {
        "error".to_string()
    } else if checks.iter().any(|c| c.is_warn()) {
        "warn".to_string()
    } else {
        "ok".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_store(config: &AppConfig) -> CheckResult {
    let path = &config.general.state_db_path;
    let store = match SqliteRecordStore::open(path).await {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::error(format!("Cannot open {}: {}", path.display(), e));
        }
    };

    let counts = async {
        let chats = store.count_active().await?;
        let records = store.count_records(&RecordFilter::default()).await?;
        let requests = store
            .count_records(&RecordFilter {
                window: None,
                requests_only: true,
            })
            .await?;
        Ok::<_, reel_radar_domain::StoreError>((chats, records, requests))
    }
    .await;
    store.close().await;

    match counts {
        Ok((0, records, _)) => CheckResult::warn(format!(
            "{}: no monitored chats yet, add one with 'reel-radar chats add <id>'",
            path.display()
        ))
        .with_details(serde_json::json!({ "active_chats": 0, "records": records })),
        Ok((chats, records, requests)) => CheckResult::ok(format!(
            "{}: {} monitored chats, {} stored messages",
            path.display(),
            chats,
            records
        ))
        .with_details(serde_json::json!({
            "active_chats": chats,
            "records": records,
            "pending_requests": requests
        })),
        Err(e) => CheckResult::error(format!("Store query failed: {}", e)),
    }
}

fn check_schedule(config: &AppConfig) -> CheckResult {
    match config.schedule() {
        Ok(schedule) => {
            let next = schedule.next_after(OffsetDateTime::now_utc());
            CheckResult::ok(format!(
                "Daily at {:02}:{:02} {}, next run {}",
                config.report.hour,
                config.report.minute,
                schedule.zone(),
                next
            ))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_telegram(config: &AppConfig) -> CheckResult {
    let env_var = &config.telegram.bot_token_env;

    let token = match load_bot_token(env_var) {
        Ok(token) => token,
        Err(_) => {
            return CheckResult::warn(format!("Bot token: {} (not set)", env_var));
        }
    };

    let messenger = TelegramMessenger::with_base_url(token, config.telegram.base_url.clone());
    match messenger.get_me().await {
        Ok(username) => CheckResult::ok(format!("Bot token: {} (valid, @{})", env_var, username)),
        Err(e) => CheckResult::error(format!("Bot token: {} rejected: {}", env_var, e)),
    }
}

fn check_report(config: &AppConfig) -> CheckResult {
    let details = serde_json::json!({
        "top_n": config.report.top_n,
        "report_day": config.report.report_day,
        "purge_policy": config.report.purge_policy,
        "purge_scope": config.report.purge_scope,
        "dry_run": config.general.dry_run,
    });

    match config.report.channel_id {
        Some(channel_id) => CheckResult::ok(format!("Report channel: {}", channel_id)),
        None => CheckResult::warn("No report channel configured (report.channel_id)"),
    }
    .with_details(details)
}

fn print_report(report: &DoctorReport) {
    println!("reel-radar Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Store", &report.store);
    print_check("Schedule", &report.schedule);
    print_check("Telegram", &report.telegram);
    print_check("Report", &report.report);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: reel-radar run --dry-run --once");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        "skipped" => "-",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
