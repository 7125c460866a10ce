//! Wire protocol for client-server communication.

use chat_relay_session::TurnRequest;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message text.
    pub message: String,
    /// Session to continue. Absent or empty starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Upstream model override.
    #[serde(default)]
    pub model: Option<String>,
}

impl From<ChatRequest> for TurnRequest {
    fn from(request: ChatRequest) -> Self {
        Self {
            message: request.message,
            session_id: request.session_id,
            model: request.model,
        }
    }
}

/// Liveness payload for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    #[must_use]
    pub fn live() -> Self {
        Self {
            status: "Backend is live and ready".to_string(),
            message: "POST /api/chat to start a conversation".to_string(),
        }
    }
}

/// Error body for failures raised before streaming starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
