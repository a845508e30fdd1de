//! reel-radar adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite record store and chat registry
//! - `telegram`: Telegram Bot API update source and messenger
//! - `outbox`: JSONL outbox messenger for reviewing reports

pub mod outbox;
mod store_sqlite;

pub mod telegram;

/// Re-exports for store adapters
pub mod store {
    pub use crate::store_sqlite::SqliteRecordStore;
}
