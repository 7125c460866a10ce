//! HTTP routes: liveness and the streaming chat endpoint.

use std::{convert::Infallible, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response, sse::Sse},
    routing::{get, post},
};
use chat_relay_core::traits::{CompletionProvider, SessionStorage};
use chat_relay_session::SessionManager;
use futures::StreamExt;

use crate::protocol::{ChatRequest, ErrorResponse, StatusResponse};

/// Response header carrying the resolved session id of a chat turn.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Liveness handler.
pub async fn status_handler() -> Json<StatusResponse> {
    tracing::info!("Someone visited the root page");
    Json(StatusResponse::live())
}

/// Chat handler.
///
/// Always answers `200 text/event-stream` once the user turn is recorded;
/// upstream failures arrive as an `error` event inside the stream.
pub async fn chat_handler<S, P>(
    State(manager): State<Arc<SessionManager<S, P>>>,
    Json(request): Json<ChatRequest>,
) -> Response
where
    S: SessionStorage + 'static,
    P: CompletionProvider + 'static,
{
    tracing::info!(
        session_id = request.session_id.as_deref().unwrap_or("<new>"),
        message_len = request.message.len(),
        "Received chat request"
    );
    tracing::debug!(message = %request.message, "Chat request body");

    let turn = match manager.start_turn(request.into()).await {
        Ok(turn) => turn,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start chat turn");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let events = turn
        .events
        .map(|event| Ok::<_, Infallible>(event.to_sse_event()));
    let mut response = Sse::new(events).into_response();

    match HeaderValue::from_str(&turn.session_id) {
        Ok(value) => {
            response.headers_mut().insert(SESSION_ID_HEADER, value);
        }
        Err(e) => {
            tracing::warn!(session_id = %turn.session_id, error = %e, "Session id is not a valid header value");
        }
    }

    response
}

/// Create the chat router.
///
/// # Example
/// ```ignore
/// let manager = Arc::new(SessionManager::new(MemoryStorage::new(), client));
/// let app = create_chat_router(manager).layer(CorsLayer::permissive());
/// ```
#[must_use]
pub fn create_chat_router<S, P>(manager: Arc<SessionManager<S, P>>) -> Router
where
    S: SessionStorage + 'static,
    P: CompletionProvider + 'static,
{
    Router::new()
        .route("/", get(status_handler))
        .route("/api/chat", post(chat_handler::<S, P>))
        .with_state(manager)
}
