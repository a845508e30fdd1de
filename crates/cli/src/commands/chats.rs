//! Chats command - manage the monitored chat registry

use anyhow::{Context, Result};
use reel_radar_domain::{ChatRegistry, MessageStore, MonitoredChat};
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::args::{ChatsArgs, ChatsCommands};
use crate::commands::open_store;
use crate::config::AppConfig;

pub async fn execute(args: ChatsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = open_store(&config).await?;

    let result = match args.command {
        ChatsCommands::Add { chat_id, added_by } => {
            let chat = MonitoredChat::active(chat_id, added_by, OffsetDateTime::now_utc());
            store
                .add_chat(&chat)
                .await
                .context("Failed to add chat")
                .map(|added| {
                    if added {
                        tracing::info!(chat_id, "Chat added to monitoring");
                        println!("✅ Chat {} added to monitoring", chat_id);
                    } else {
                        println!("⚠️ Chat {} is already being monitored", chat_id);
                    }
                })
        }
        ChatsCommands::Remove { chat_id } => store
            .remove_chat(chat_id)
            .await
            .context("Failed to remove chat")
            .map(|removed| {
                if removed {
                    tracing::info!(chat_id, "Chat removed from monitoring");
                    println!("✅ Chat {} removed from monitoring", chat_id);
                } else {
                    println!("❌ Chat {} was not being monitored", chat_id);
                }
            }),
        ChatsCommands::List { json } => store
            .list_chats()
            .await
            .context("Failed to list chats")
            .and_then(|chats| print_chats(&chats, json)),
    };

    store.close().await;
    result
}

fn print_chats(chats: &[MonitoredChat], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!("No monitored chats.");
        return Ok(());
    }

    println!("Monitored chats ({}):", chats.len());
    for chat in chats {
        let added_at = chat
            .added_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| chat.added_at.to_string());
        match chat.added_by {
            Some(admin) => println!(
                "  {} [{}] added {} by {}",
                chat.chat_id,
                chat.status.as_str(),
                added_at,
                admin
            ),
            None => println!(
                "  {} [{}] added {}",
                chat.chat_id,
                chat.status.as_str(),
                added_at
            ),
        }
    }

    Ok(())
}
