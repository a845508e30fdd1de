//! Telegram Bot API adapters

mod read;
mod write;

pub use read::TelegramUpdateSource;
pub use write::TelegramMessenger;

use reel_radar_domain::TransportError;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Hard limit Telegram puts on a single text message
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Envelope wrapping every Bot API response
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build HTTP client, using defaults");
            Client::new()
        })
}

/// Map a Bot API response to its result or a transport error
async fn read_result<T: DeserializeOwned>(
    response: Response,
    method: &str,
) -> Result<T, TransportError> {
    let status = response.status();
    let body: Option<ApiResponse<T>> = response.json().await.ok();

    let description = body
        .as_ref()
        .and_then(|b| b.description.clone())
        .unwrap_or_else(|| status.to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
        // Telegram answers 404 for an unknown bot token
        return Err(TransportError::Auth(description));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = body
            .as_ref()
            .and_then(|b| b.parameters.as_ref())
            .and_then(|p| p.retry_after)
            .map(Duration::from_secs);
        return Err(TransportError::RateLimited(retry_after));
    }

    match body {
        Some(ApiResponse {
            ok: true,
            result: Some(result),
            ..
        }) if status.is_success() => Ok(result),
        _ => Err(TransportError::Api(format!(
            "{} failed: {}",
            method, description
        ))),
    }
}
