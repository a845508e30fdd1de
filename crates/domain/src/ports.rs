//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{InboundMessage, MessageRecord, MonitoredChat, OutboundMessage, RecordFilter};

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting classified messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a single record
    async fn insert_record(&self, record: &MessageRecord) -> Result<(), StoreError>;

    /// Records matching the filter, oldest first
    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, StoreError>;

    /// Delete every record matching the filter, returning how many went
    async fn delete_records(&self, filter: &RecordFilter) -> Result<u64, StoreError>;

    /// Count records matching the filter
    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError>;

    /// Release underlying resources
    async fn close(&self) {}
}

/// Port for the set of monitored chats
#[async_trait]
pub trait ChatRegistry: Send + Sync {
    /// Register a chat; returns false if it was already registered
    async fn add_chat(&self, chat: &MonitoredChat) -> Result<bool, StoreError>;

    /// Unregister a chat; returns false if it was not registered
    async fn remove_chat(&self, chat_id: i64) -> Result<bool, StoreError>;

    /// True iff the chat is registered and active
    async fn is_monitored(&self, chat_id: i64) -> Result<bool, StoreError>;

    async fn list_chats(&self) -> Result<Vec<MonitoredChat>, StoreError>;

    async fn count_active(&self) -> Result<u64, StoreError>;
}

/// Error type for chat transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Content too long: {len} > {max}")]
    ContentTooLong { len: usize, max: usize },
}

/// Port for receiving messages from the chat platform
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch messages that arrived since the previous call
    async fn fetch_updates(&self) -> Result<Vec<InboundMessage>, TransportError>;
}

/// Result of a successful send
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Platform-specific message ID
    pub id: String,
}

/// Port for sending text to chats and channels
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message, returns the platform message ID
    async fn send(&self, message: &OutboundMessage) -> Result<SentMessage, TransportError>;

    /// Check if this messenger actually delivers
    fn is_enabled(&self) -> bool;

    /// Get the platform name (e.g., "telegram", "outbox")
    fn platform(&self) -> &'static str;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
