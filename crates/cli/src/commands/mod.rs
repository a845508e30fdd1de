//! Subcommand implementations

pub mod chats;
pub mod classify;
pub mod config;
pub mod doctor;
pub mod report;
pub mod run;
pub mod stats;

use anyhow::{Context, Result, bail};
use reel_radar_adapters::{
    outbox::{OutboxMessenger, OutboxWriter},
    store::SqliteRecordStore,
    telegram::TelegramMessenger,
};
use reel_radar_domain::Messenger;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;

/// Open the SQLite store named in the config
pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<SqliteRecordStore>> {
    let store = SqliteRecordStore::open(&config.general.state_db_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open record store at {}",
                config.general.state_db_path.display()
            )
        })?;
    Ok(Arc::new(store))
}

/// Read the bot token from the env var the config names
pub(crate) fn load_bot_token(env_var: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No bot token env var configured (telegram.bot_token_env)");
    }

    let token = std::env::var(env_var)
        .with_context(|| format!("Missing bot token env var {}", env_var))?;

    if token.trim().is_empty() {
        bail!("Bot token env var {} is empty", env_var);
    }

    Ok(SecretString::new(token.trim().into()))
}

/// Pick where reports go: an outbox file, nowhere (dry run) or Telegram
pub(crate) async fn build_messenger(
    config: &AppConfig,
    dry_run: bool,
    outbox: Option<PathBuf>,
) -> Result<Arc<dyn Messenger>> {
    if let Some(path) = outbox {
        let writer = OutboxWriter::open(path.clone())
            .await
            .with_context(|| format!("Failed to open outbox {}", path.display()))?;
        tracing::info!(outbox = %path.display(), "Writing reports to outbox");
        return Ok(Arc::new(OutboxMessenger::new(writer)));
    }

    if dry_run {
        return Ok(Arc::new(TelegramMessenger::disabled()));
    }

    let token = load_bot_token(&config.telegram.bot_token_env)?;
    Ok(Arc::new(TelegramMessenger::with_base_url(
        token,
        config.telegram.base_url.clone(),
    )))
}
