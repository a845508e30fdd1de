//! Telegram write adapter - sendMessage

use async_trait::async_trait;
use reel_radar_domain::{Messenger, OutboundMessage, SentMessage, TransportError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DEFAULT_BASE_URL, MAX_MESSAGE_CHARS, build_client, read_result};

/// Messenger posting plain text through the Bot API
pub struct TelegramMessenger {
    client: Client,
    bot_token: SecretString,
    base_url: String,
    enabled: bool,
}

impl TelegramMessenger {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(bot_token: SecretString, base_url: String) -> Self {
        Self {
            client: build_client(Duration::from_secs(30)),
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            enabled: true,
        }
    }

    /// Create a disabled messenger (for testing/dry-run)
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            bot_token: SecretString::new("".into()),
            base_url: String::new(),
            enabled: false,
        }
    }

    /// Resolve the bot's own username, which also proves the token works
    pub async fn get_me(&self) -> Result<String, TransportError> {
        let url = format!("{}/bot{}/getMe", self.base_url, self.bot_token.expose_secret());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let me: BotUser = read_result(response, "getMe").await?;
        Ok(me.username.unwrap_or_default())
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct SentMessageResult {
    message_id: i64,
}

#[derive(Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<SentMessage, TransportError> {
        if !self.enabled {
            return Err(TransportError::Api("Messenger is disabled".to_string()));
        }

        let len = message.text.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(TransportError::ContentTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            reply_to_message_id: message.reply_to,
            disable_web_page_preview: true,
        };

        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let sent: SentMessageResult = read_result(response, "sendMessage").await?;

        tracing::debug!(
            chat_id = message.chat_id,
            message_id = sent.message_id,
            "Sent Telegram message"
        );

        Ok(SentMessage {
            id: sent.message_id.to_string(),
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> &'static str {
        "telegram"
    }
}
