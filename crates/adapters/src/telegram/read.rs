//! Telegram read adapter - long-polls getUpdates

use async_trait::async_trait;
use reel_radar_domain::{InboundMessage, TransportError, UpdateSource};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;

use super::{DEFAULT_BASE_URL, build_client, read_result};

/// Update source backed by the Bot API `getUpdates` long poll
pub struct TelegramUpdateSource {
    client: Client,
    bot_token: SecretString,
    base_url: String,
    poll_timeout_secs: u64,
    /// Next update_id to ask for; None until the first batch arrives
    offset: Mutex<Option<i64>>,
}

impl TelegramUpdateSource {
    pub fn new(bot_token: SecretString, poll_timeout_secs: u64) -> Self {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL.to_string(), poll_timeout_secs)
    }

    pub fn with_base_url(bot_token: SecretString, base_url: String, poll_timeout_secs: u64) -> Self {
        // The HTTP timeout has to outlive the server-side long poll
        let client = build_client(Duration::from_secs(poll_timeout_secs + 10));

        Self {
            client,
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_timeout_secs,
            offset: Mutex::new(None),
        }
    }

    fn current_offset(&self) -> Result<Option<i64>, TransportError> {
        self.offset
            .lock()
            .map(|o| *o)
            .map_err(|e| TransportError::Api(e.to_string()))
    }

    fn advance_offset(&self, last_update_id: i64) -> Result<(), TransportError> {
        let mut offset = self
            .offset
            .lock()
            .map_err(|e| TransportError::Api(e.to_string()))?;
        *offset = Some(last_update_id + 1);
        Ok(())
    }
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    message_id: i64,
    from: Option<User>,
    chat: Chat,
    date: i64,
    text: Option<String>,
}

#[derive(Deserialize)]
struct User {
    id: i64,
    username: Option<String>,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
    title: Option<String>,
}

impl Message {
    fn into_inbound(self) -> InboundMessage {
        let sent_at =
            OffsetDateTime::from_unix_timestamp(self.date).unwrap_or(OffsetDateTime::UNIX_EPOCH);

        InboundMessage {
            chat_id: self.chat.id,
            chat_title: self.chat.title,
            user_id: self.from.as_ref().map(|u| u.id),
            username: self.from.and_then(|u| u.username),
            text: self.text,
            message_id: self.message_id,
            sent_at,
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramUpdateSource {
    async fn fetch_updates(&self) -> Result<Vec<InboundMessage>, TransportError> {
        let offset = self.current_offset()?;
        let url = format!(
            "{}/bot{}/getUpdates",
            self.base_url,
            self.bot_token.expose_secret()
        );

        let mut query = vec![
            ("timeout", self.poll_timeout_secs.to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        tracing::debug!(offset = ?offset, "Polling Telegram for updates");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let updates: Vec<Update> = read_result(response, "getUpdates").await?;

        let Some(last_update_id) = updates.iter().map(|u| u.update_id).max() else {
            return Ok(vec![]);
        };
        self.advance_offset(last_update_id)?;

        let messages: Vec<InboundMessage> = updates
            .into_iter()
            .filter_map(|u| u.message)
            .map(Message::into_inbound)
            .collect();

        tracing::debug!(
            count = messages.len(),
            next_offset = last_update_id + 1,
            "Received updates"
        );

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> TelegramUpdateSource {
        TelegramUpdateSource::with_base_url(SecretString::new("test-token".into()), server.uri(), 0)
    }

    #[tokio::test]
    async fn test_fetch_updates_maps_messages_and_advances_offset() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/getUpdates"))
            .and(query_param("offset", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": []
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 10,
                        "message": {
                            "message_id": 501,
                            "from": {"id": 7, "is_bot": false, "first_name": "Ann", "username": "ann"},
                            "chat": {"id": -1001, "type": "supergroup", "title": "Movie Club"},
                            "date": 1715332500,
                            "text": "need Inception and Interstellar please"
                        }
                    },
                    {
                        "update_id": 11,
                        "message": {
                            "message_id": 502,
                            "chat": {"id": -1001, "type": "supergroup", "title": "Movie Club"},
                            "date": 1715332560
                        }
                    }
                ]
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        let source = source(&mock_server);
        let messages = source.fetch_updates().await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].chat_id, -1001);
        assert_eq!(messages[0].chat_title.as_deref(), Some("Movie Club"));
        assert_eq!(messages[0].user_id, Some(7));
        assert_eq!(messages[0].username.as_deref(), Some("ann"));
        assert_eq!(messages[0].message_id, 501);
        assert_eq!(messages[0].sent_at.unix_timestamp(), 1715332500);
        assert!(messages[1].text.is_none());
        assert!(messages[1].user_id.is_none());

        // Next poll acknowledges the batch
        let messages = source.fetch_updates().await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_updates_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            })))
            .mount(&mock_server)
            .await;

        let result = source(&mock_server).fetch_updates().await;
        assert!(matches!(result, Err(TransportError::Auth(_))));
    }

    #[tokio::test]
    async fn test_fetch_updates_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bottest-token/getUpdates"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 5",
                "parameters": {"retry_after": 5}
            })))
            .mount(&mock_server)
            .await;

        let result = source(&mock_server).fetch_updates().await;
        assert!(matches!(
            result,
            Err(TransportError::RateLimited(Some(d))) if d == Duration::from_secs(5)
        ));
    }
}
