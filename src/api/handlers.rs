//! HTTP request handlers

use super::types::{
    ErrorResponse, StatusResponse, VersionResponse, WebhookEvent, NEW_CHATBOT_MESSAGE,
};
use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat platform webhook
        .route("/", post(chat_callback))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

async fn chat_callback(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<(StatusCode, Json<StatusResponse>), AppError> {
    tracing::info!(event_type = ?event.event_type, "Received webhook");

    if event.event_type.as_deref() != Some(NEW_CHATBOT_MESSAGE) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::UNSUPPORTED_TYPE),
        ));
    }

    let message = event.new_chatbot_message.unwrap_or_default();
    let conversation_id = match message.conversation_id() {
        Some(id) if message.is_from_human() => id.to_string(),
        _ => {
            tracing::warn!("Ignoring non-human message or message without conversation ID");
            return Ok((StatusCode::OK, Json(StatusResponse::IGNORED)));
        }
    };
    let text = message.text.unwrap_or_default();

    state
        .runtime
        .submit(&conversation_id, &text)
        .await
        .map_err(AppError::Internal)?;

    Ok((StatusCode::OK, Json(StatusResponse::PROCESSED)))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!(status = %status, error = %message, "Request failed");
        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
