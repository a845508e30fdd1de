//! Hand-written fakes shared by the use case tests

use crate::model::{
    ChatStatus, InboundMessage, MessageRecord, MonitoredChat, OutboundMessage, RecordFilter,
};
use crate::ports::{
    ChatRegistry, Clock, MessageStore, Messenger, SentMessage, StoreError, TransportError,
};
use async_trait::async_trait;
use std::sync::Mutex;
use time::OffsetDateTime;

/// Store + registry kept in plain vectors
#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<Vec<MessageRecord>>,
    pub chats: Mutex<Vec<MonitoredChat>>,
    pub fail_inserts: bool,
    pub fail_reads: bool,
}

impl FakeStore {
    pub fn with_chat(chat_id: i64) -> Self {
        let store = Self::default();
        store.chats.lock().unwrap().push(MonitoredChat::active(
            chat_id,
            None,
            OffsetDateTime::UNIX_EPOCH,
        ));
        store
    }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn insert_record(&self, record: &MessageRecord) -> Result<(), StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Database("disk full".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_records(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Database("connection lost".to_string()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !filter.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .count() as u64)
    }
}

#[async_trait]
impl ChatRegistry for FakeStore {
    async fn add_chat(&self, chat: &MonitoredChat) -> Result<bool, StoreError> {
        let mut chats = self.chats.lock().unwrap();
        if chats.iter().any(|c| c.chat_id == chat.chat_id) {
            return Ok(false);
        }
        chats.push(chat.clone());
        Ok(true)
    }

    async fn remove_chat(&self, chat_id: i64) -> Result<bool, StoreError> {
        let mut chats = self.chats.lock().unwrap();
        let before = chats.len();
        chats.retain(|c| c.chat_id != chat_id);
        Ok(chats.len() < before)
    }

    async fn is_monitored(&self, chat_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.chat_id == chat_id && c.status == ChatStatus::Active))
    }

    async fn list_chats(&self) -> Result<Vec<MonitoredChat>, StoreError> {
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status == ChatStatus::Active)
            .count() as u64)
    }
}

pub struct FakeClock {
    pub time: OffsetDateTime,
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        self.time
    }
}

/// Messenger that remembers what it was asked to send
#[derive(Default)]
pub struct FakeMessenger {
    pub sent: Mutex<Vec<OutboundMessage>>,
    /// Fail every send after this many successes
    pub fail_after: Option<usize>,
}

impl FakeMessenger {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            fail_after: Some(0),
        }
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<SentMessage, TransportError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        sent.push(message.clone());
        Ok(SentMessage {
            id: sent.len().to_string(),
        })
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn platform(&self) -> &'static str {
        "fake"
    }
}

pub fn inbound(chat_id: i64, message_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id,
        chat_title: Some("Movie Club".to_string()),
        user_id: Some(7),
        username: Some("cinephile".to_string()),
        text: Some(text.to_string()),
        message_id,
        sent_at: OffsetDateTime::UNIX_EPOCH,
    }
}
