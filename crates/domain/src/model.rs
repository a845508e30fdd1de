//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::zone::Zone;

/// A text message delivered by the chat transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Chat the message was posted in
    pub chat_id: i64,
    /// Chat title, when the platform exposes one
    pub chat_title: Option<String>,
    /// Sender, absent for anonymous channel posts
    pub user_id: Option<i64>,
    /// Sender handle without the leading @
    pub username: Option<String>,
    /// Message text, absent for media-only messages
    pub text: Option<String>,
    /// Platform message ID (unique per chat)
    pub message_id: i64,
    /// When the platform says the message was sent
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

/// Outcome of running the request heuristic over a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// True iff at least one candidate title survived filtering
    pub is_request: bool,
    /// Extracted candidate titles, in segment order
    pub titles: Vec<String>,
}

impl Classification {
    pub fn not_a_request() -> Self {
        Self::default()
    }

    pub fn from_titles(titles: Vec<String>) -> Self {
        Self {
            is_request: !titles.is_empty(),
            titles,
        }
    }
}

/// A persisted, classified message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique record ID
    pub id: Uuid,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub text: String,
    /// Ingestion time, taken from the same clock as report windows
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_movie_request: bool,
    pub extracted_titles: Vec<String>,
    pub message_id: i64,
}

impl MessageRecord {
    /// Build a record for an inbound message and its classification
    pub fn new(
        message: &InboundMessage,
        text: &str,
        classification: Classification,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id: message.chat_id,
            chat_title: message.chat_title.clone(),
            user_id: message.user_id,
            username: message.username.clone(),
            text: text.to_string(),
            timestamp,
            is_movie_request: classification.is_request,
            extracted_titles: classification.titles,
            message_id: message.message_id,
        }
    }
}

/// Monitoring status of a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    #[default]
    Active,
    Inactive,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Active => "active",
            ChatStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ChatStatus::Active),
            "inactive" => Some(ChatStatus::Inactive),
            _ => None,
        }
    }
}

/// A group chat whose messages are ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredChat {
    pub chat_id: i64,
    pub status: ChatStatus,
    /// Admin who registered the chat, if known
    pub added_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

impl MonitoredChat {
    pub fn active(chat_id: i64, added_by: Option<i64>, added_at: OffsetDateTime) -> Self {
        Self {
            chat_id,
            status: ChatStatus::Active,
            added_by,
            added_at,
        }
    }
}

/// A half-open local calendar day `[start, end)`.
///
/// Days in zones with daylight saving can be 23 or 25 hours long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl DayWindow {
    /// The local calendar day in `zone` that contains `instant`
    pub fn containing(instant: OffsetDateTime, zone: Zone) -> Self {
        Self::for_date(zone.to_local(instant).date(), zone)
    }

    /// The window for a calendar date in `zone`
    pub fn for_date(date: Date, zone: Zone) -> Self {
        let start = zone.resolve(PrimitiveDateTime::new(date, Time::MIDNIGHT));
        let end = match date.next_day() {
            Some(next) => zone.resolve(PrimitiveDateTime::new(next, Time::MIDNIGHT)),
            None => start + Duration::days(1),
        };
        Self { start, end }
    }

    /// The local day before this one
    pub fn previous(&self, zone: Zone) -> Self {
        match self.date().previous_day() {
            Some(day) => Self::for_date(day, zone),
            None => Self {
                start: self.start - Duration::days(1),
                end: self.start,
            },
        }
    }

    pub fn date(&self) -> Date {
        self.start.date()
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Query predicate shared by find, count and delete
///
/// The report input and the purge use the same filter value, so a purge can
/// never reach records the report did not consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFilter {
    /// Restrict to timestamps inside this window
    pub window: Option<DayWindow>,
    /// Restrict to records flagged as movie requests
    pub requests_only: bool,
}

impl RecordFilter {
    /// Every record in the window
    pub fn all_in(window: DayWindow) -> Self {
        Self {
            window: Some(window),
            requests_only: false,
        }
    }

    /// Movie requests in the window
    pub fn requests_in(window: DayWindow) -> Self {
        Self {
            window: Some(window),
            requests_only: true,
        }
    }

    pub fn matches(&self, record: &MessageRecord) -> bool {
        if self.requests_only && !record.is_movie_request {
            return false;
        }
        match self.window {
            Some(window) => window.contains(record.timestamp),
            None => true,
        }
    }
}

/// A title and how often it was requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTitle {
    /// Title-cased for presentation
    pub title: String,
    pub count: u64,
}

/// The ranked "most requested titles" report for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub window: DayWindow,
    /// Top titles by count descending, ties in first-seen order
    pub ranked: Vec<RankedTitle>,
    /// Movie-request records considered (not all messages)
    pub window_record_count: u64,
    /// Every title occurrence, duplicates included
    pub total_extracted_requests: u64,
    /// Distinct normalized titles
    pub unique_title_count: u64,
}

impl DailyReport {
    pub fn empty(window: DayWindow) -> Self {
        Self {
            window,
            ranked: vec![],
            window_record_count: 0,
            total_extracted_requests: 0,
            unique_title_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.window_record_count == 0
    }
}

/// Counters for the statistics command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStats {
    pub active_chats: u64,
    pub messages_today: u64,
    pub requests_today: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// A text message to send through the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    /// Message to reply to, if any
    pub reply_to: Option<i64>,
}

impl OutboundMessage {
    pub fn to_chat(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
        }
    }
}

/// Which day a scheduled report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportDay {
    /// The day containing the moment the job runs. Requests arriving after
    /// the run belong to a window no later run reads, so this only suits a
    /// schedule at the very end of the day.
    Current,
    /// The day before the job runs, so every day is reported once
    #[default]
    Previous,
}

/// When a report job purges the records it reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurgePolicy {
    /// Only after every part of the report was delivered
    #[default]
    OnDelivery,
    /// After attempting delivery, whatever the outcome
    Always,
    /// Never purge
    Never,
}

/// Which records a purge deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurgeScope {
    /// Exactly the records the report was built from
    #[default]
    ReportInput,
    /// Every message in the report window, requests or not
    Window,
}

/// Processing result for a single inbound message
#[derive(Debug)]
pub enum IngestResult {
    /// Message was classified and stored
    Stored { record_id: Uuid, is_request: bool },
    /// Message was skipped (unmonitored chat, no text, ignored, etc.)
    Skipped { reason: String },
    /// Classification succeeded but storing failed
    Failed { error: String },
}
