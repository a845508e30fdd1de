//! Ingest use case - classify and persist messages from monitored chats

use std::sync::Arc;

use regex::Regex;

use crate::{
    model::{IngestResult, InboundMessage, MessageRecord},
    ports::{ChatRegistry, Clock, MessageStore},
    usecases::classify::RequestClassifier,
};

/// Configuration for ingestion
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Regex patterns for message texts to ignore
    pub ignore_patterns: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            // Bot commands are never movie requests
            ignore_patterns: vec!["^/".to_string()],
        }
    }
}

/// Classifies inbound messages and stores them, one at a time
pub struct Ingestor<St, Ch, Cl>
where
    St: MessageStore + ?Sized,
    Ch: ChatRegistry + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    chats: Arc<Ch>,
    clock: Arc<Cl>,
    classifier: RequestClassifier,
    ignore_patterns: Vec<Regex>,
}

impl<St, Ch, Cl> Ingestor<St, Ch, Cl>
where
    St: MessageStore + ?Sized,
    Ch: ChatRegistry + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        store: Arc<St>,
        chats: Arc<Ch>,
        clock: Arc<Cl>,
        classifier: RequestClassifier,
        config: IngestConfig,
    ) -> Self {
        let ignore_patterns = compile_ignore_patterns(&config.ignore_patterns);
        Self {
            store,
            chats,
            clock,
            classifier,
            ignore_patterns,
        }
    }

    /// Process a batch in arrival order
    pub async fn ingest_batch(&self, messages: Vec<InboundMessage>) -> Vec<(i64, IngestResult)> {
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            let result = self.ingest(&message).await;
            results.push((message.message_id, result));
        }
        results
    }

    /// Process a single message. Failures are reported, never propagated.
    pub async fn ingest(&self, message: &InboundMessage) -> IngestResult {
        let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) else {
            return IngestResult::Skipped {
                reason: "No text".to_string(),
            };
        };

        if self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
        {
            return IngestResult::Skipped {
                reason: "Matches ignore pattern".to_string(),
            };
        }

        match self.chats.is_monitored(message.chat_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(chat_id = message.chat_id, "Chat not monitored, skipping");
                return IngestResult::Skipped {
                    reason: "Chat not monitored".to_string(),
                };
            }
            Err(e) => {
                tracing::error!(
                    chat_id = message.chat_id,
                    error = %e,
                    "Failed to check chat membership"
                );
                return IngestResult::Failed {
                    error: format!("Membership check failed: {}", e),
                };
            }
        }

        let classification = self.classifier.classify(text);
        let record = MessageRecord::new(message, text, classification, self.clock.now());

        if let Err(e) = self.store.insert_record(&record).await {
            tracing::error!(
                chat_id = message.chat_id,
                message_id = message.message_id,
                error = %e,
                "Failed to store message"
            );
            return IngestResult::Failed {
                error: format!("Store failed: {}", e),
            };
        }

        if record.is_movie_request {
            tracing::info!(
                chat_id = record.chat_id,
                titles = ?record.extracted_titles,
                "Movie request detected"
            );
        }

        IngestResult::Stored {
            record_id: record.id,
            is_request: record.is_movie_request,
        }
    }
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(error) => {
                tracing::warn!(pattern = %pattern, error = %error, "Invalid ignore pattern");
                None
            }
        })
        .collect()
}
