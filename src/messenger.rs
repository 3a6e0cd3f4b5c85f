//! Outbound chat messages
//!
//! Sends bot replies into a conversation through the chat platform's bot
//! message endpoint.

mod error;

pub use error::{MessengerError, MessengerErrorKind};

use crate::runtime::Messenger;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// HTTP client for the chat platform's bot API
pub struct ChatApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ChatApiClient {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, MessengerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MessengerError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn message_url(&self, conv_id: &str) -> String {
        format!(
            "{}/experimental/open-platform/chat/bot/conversations/{conv_id}/messages",
            self.base_url
        )
    }
}

#[async_trait]
impl Messenger for ChatApiClient {
    async fn send_message(&self, conv_id: &str, text: &str) -> Result<(), MessengerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MessengerError::auth("No chat API key configured"))?;

        let url = self.message_url(conv_id);
        let payload = OutboundMessage::text(text);

        tracing::debug!(conv_id = %conv_id, url = %url, "Sending bot message");

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MessengerError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    MessengerError::network(format!("Connection failed: {e}"))
                } else {
                    MessengerError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MessengerError::from_status(status.as_u16(), &body))
    }
}

/// Bot message body
#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    r#type: &'static str,
    text_message: &'a str,
}

impl<'a> OutboundMessage<'a> {
    fn text(text_message: &'a str) -> Self {
        Self {
            r#type: "TEXT",
            text_message,
        }
    }
}
