//! API request and response types

use serde::{Deserialize, Serialize};

/// Webhook event type carrying a chat message
pub const NEW_CHATBOT_MESSAGE: &str = "NEW_CHATBOT_MESSAGE";

/// Sender type of messages typed by an end user
pub const HUMAN_SENDER: &str = "HUMAN";

/// Inbound webhook body. Every field is optional so that partial payloads
/// are classified rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub new_chatbot_message: Option<ChatbotMessage>,
}

/// Chat message inside a `NEW_CHATBOT_MESSAGE` event
#[derive(Debug, Default, Deserialize)]
pub struct ChatbotMessage {
    #[serde(default)]
    pub conversation: Option<ConversationRef>,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ChatbotMessage {
    /// Conversation id, if present and non-empty
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_from_human(&self) -> bool {
        self.sender
            .as_ref()
            .and_then(|s| s.sender_type.as_deref())
            == Some(HUMAN_SENDER)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sender {
    #[serde(rename = "type", default)]
    pub sender_type: Option<String>,
}

/// Webhook outcome
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub const IGNORED: Self = Self { status: "ignored" };
    pub const PROCESSED: Self = Self {
        status: "processed",
    };
    pub const UNSUPPORTED_TYPE: Self = Self {
        status: "unsupported_type",
    };
}

/// Response for the version endpoint
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
