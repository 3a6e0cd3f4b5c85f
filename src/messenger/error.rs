//! Messenger error types

use thiserror::Error;

/// Delivery error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MessengerError {
    pub kind: MessengerErrorKind,
    pub message: String,
}

impl MessengerError {
    pub fn new(kind: MessengerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(MessengerErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            429 => Self::rate_limit(format!("Rate limited: {body}")),
            500..=599 => Self::server_error(format!("Server error: {body}")),
            400..=499 => Self::invalid_request(format!("Bad request: {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Error classification. Nothing retries today; the flag is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessengerErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Missing or rejected API key (401, 403)
    Auth,
    /// Bad request (4xx)
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl MessengerErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
