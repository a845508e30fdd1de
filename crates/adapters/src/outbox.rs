//! Outbox messenger - appends outgoing reports to a JSONL file instead of
//! sending them, so they can be reviewed first.

use async_trait::async_trait;
use reel_radar_domain::model::OutboundMessage;
use reel_radar_domain::ports::{Messenger, SentMessage, TransportError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only JSONL sink shared by clones
#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn open(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: String,
    #[serde(with = "time::serde::rfc3339")]
    written_at: OffsetDateTime,
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<i64>,
    text: &'a str,
}

/// Messenger that records messages in an outbox file
#[derive(Debug, Clone)]
pub struct OutboxMessenger {
    writer: OutboxWriter,
}

impl OutboxMessenger {
    pub fn new(writer: OutboxWriter) -> Self {
        Self { writer }
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}

#[async_trait]
impl Messenger for OutboxMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<SentMessage, TransportError> {
        let entry = OutboxEntry {
            id: Uuid::new_v4().to_string(),
            written_at: OffsetDateTime::now_utc(),
            chat_id: message.chat_id,
            reply_to: message.reply_to,
            text: &message.text,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|error| TransportError::Api(format!("Outbox write failed: {}", error)))?;

        tracing::info!(
            path = %self.writer.path().display(),
            chat_id = message.chat_id,
            "Wrote message to outbox"
        );

        Ok(SentMessage { id: entry.id })
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn platform(&self) -> &'static str {
        "outbox"
    }
}
