//! SQLite record store implementation

use async_trait::async_trait;
use reel_radar_domain::{
    ChatRegistry, ChatStatus, MessageRecord, MessageStore, MonitoredChat, RecordFilter,
    StoreError,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use uuid::Uuid;

type RecordRow = (
    String,
    i64,
    Option<String>,
    Option<i64>,
    Option<String>,
    String,
    i64,
    bool,
    String,
    i64,
);

type ChatRow = (i64, String, Option<i64>, i64);

/// SQLite-backed message store and chat registry
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (or create) the database file and run migrations
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::debug!(path = %db_path.display(), "Opened record store");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                chat_title TEXT,
                user_id INTEGER,
                username TEXT,
                text TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                is_movie_request INTEGER NOT NULL,
                extracted_titles TEXT NOT NULL,
                message_id INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        // Every query is a time window, optionally narrowed to requests
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_window
            ON messages(timestamp_ms, is_movie_request)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chats (
                chat_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                added_by INTEGER,
                added_at_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

fn to_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Append the WHERE clause for a filter
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &RecordFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(window) = filter.window {
        builder
            .push(" AND timestamp_ms >= ")
            .push_bind(to_millis(window.start))
            .push(" AND timestamp_ms < ")
            .push_bind(to_millis(window.end));
    }
    if filter.requests_only {
        builder.push(" AND is_movie_request = 1");
    }
}

fn record_from_row(row: RecordRow) -> Result<MessageRecord, StoreError> {
    let (
        id,
        chat_id,
        chat_title,
        user_id,
        username,
        text,
        timestamp_ms,
        is_movie_request,
        titles_json,
        message_id,
    ) = row;

    Ok(MessageRecord {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Serialization(e.to_string()))?,
        chat_id,
        chat_title,
        user_id,
        username,
        text,
        timestamp: from_millis(timestamp_ms)?,
        is_movie_request,
        extracted_titles: serde_json::from_str(&titles_json)
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
        message_id,
    })
}

#[async_trait]
impl MessageStore for SqliteRecordStore {
    async fn insert_record(&self, record: &MessageRecord) -> Result<(), StoreError> {
        let titles_json = serde_json::to_string(&record.extracted_titles)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO messages
            (id, chat_id, chat_title, user_id, username, text, timestamp_ms,
             is_movie_request, extracted_titles, message_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.chat_id)
        .bind(&record.chat_title)
        .bind(record.user_id)
        .bind(&record.username)
        .bind(&record.text)
        .bind(to_millis(record.timestamp))
        .bind(record.is_movie_request)
        .bind(&titles_json)
        .bind(record.message_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, chat_id, chat_title, user_id, username, text, timestamp_ms, \
             is_movie_request, extracted_titles, message_id FROM messages",
        );
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY timestamp_ms, rowid");

        let rows: Vec<RecordRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(record_from_row).collect()
    }

    async fn delete_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM messages");
        push_filter(&mut builder, filter);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM messages");
        push_filter(&mut builder, filter);

        let count: (i64,) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count.0.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Closed record store");
    }
}

#[async_trait]
impl ChatRegistry for SqliteRecordStore {
    async fn add_chat(&self, chat: &MonitoredChat) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO chats (chat_id, status, added_by, added_at_ms)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(chat_id) DO NOTHING
            "#,
        )
        .bind(chat.chat_id)
        .bind(chat.status.as_str())
        .bind(chat.added_by)
        .bind(to_millis(chat.added_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_chat(&self, chat_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM chats WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_monitored(&self, chat_id: i64) -> Result<bool, StoreError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chats WHERE chat_id = ? AND status = ?")
                .bind(chat_id)
                .bind(ChatStatus::Active.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn list_chats(&self) -> Result<Vec<MonitoredChat>, StoreError> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT chat_id, status, added_by, added_at_ms FROM chats ORDER BY added_at_ms, chat_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(chat_id, status, added_by, added_at_ms)| {
                let status = ChatStatus::parse(&status).ok_or_else(|| {
                    StoreError::Serialization(format!("Unknown chat status: {}", status))
                })?;
                Ok(MonitoredChat {
                    chat_id,
                    status,
                    added_by,
                    added_at: from_millis(added_at_ms)?,
                })
            })
            .collect()
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats WHERE status = ?")
            .bind(ChatStatus::Active.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count.0.max(0) as u64)
    }
}
