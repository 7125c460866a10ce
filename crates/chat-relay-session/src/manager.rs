//! Session manager that drives one chat turn end to end.

use std::sync::Arc;

use chat_relay_core::{
    RelayEvent, Role, project_transcript,
    traits::{CompletionProvider, CompletionRequest, SessionId, SessionStorage, StorageError},
};
use futures::{StreamExt, stream::BoxStream};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Sampling temperature sent with every completion.
pub const TEMPERATURE: f32 = 0.7;

/// Output cap sent with every completion.
pub const MAX_TOKENS: u32 = 2048;

/// Session manager error.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Caller input for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    /// Text of the user message.
    pub message: String,
    /// Existing session to continue; a new one is created when absent or empty.
    pub session_id: Option<String>,
    /// Upstream model, passed through verbatim.
    pub model: Option<String>,
}

impl TurnRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A turn in progress.
pub struct Turn {
    /// Resolved session; generated when the request carried none.
    pub session_id: SessionId,
    /// Chunk events followed by exactly one terminal event.
    pub events: BoxStream<'static, RelayEvent>,
}

/// Session manager for relaying chat turns.
pub struct SessionManager<S, P>
where
    S: SessionStorage,
    P: CompletionProvider,
{
    storage: Arc<S>,
    provider: Arc<P>,
    default_model: String,
}

impl<S, P> SessionManager<S, P>
where
    S: SessionStorage + 'static,
    P: CompletionProvider + 'static,
{
    /// Create a new session manager.
    #[must_use]
    pub fn new(storage: S, provider: P) -> Self {
        Self {
            storage: Arc::new(storage),
            provider: Arc::new(provider),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the model used when a request names none.
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Session storage backing this manager.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Upstream provider backing this manager.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Record the user message and start relaying the reply.
    ///
    /// The upstream call is made lazily when `events` is first polled.
    /// Upstream failures never surface here; they end the event stream
    /// with a single [`RelayEvent::Error`].
    ///
    /// # Errors
    /// Returns error if the session cannot be resolved or recorded.
    pub async fn start_turn(&self, request: TurnRequest) -> Result<Turn, ManagerError> {
        let (session_id, history) = self
            .storage
            .begin_turn(request.session_id.as_deref(), request.message)
            .await?;

        tracing::info!(
            session_id = %session_id,
            history_len = history.len(),
            "User message added"
        );

        let completion = CompletionRequest {
            model: request
                .model
                .unwrap_or_else(|| self.default_model.clone()),
            messages: project_transcript(&history),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let events = relay(
            Arc::clone(&self.storage),
            Arc::clone(&self.provider),
            session_id.clone(),
            completion,
        );

        Ok(Turn { session_id, events })
    }
}

/// Fold the upstream deltas into chunk events and one accumulated reply.
fn relay<S, P>(
    storage: Arc<S>,
    provider: Arc<P>,
    session_id: SessionId,
    request: CompletionRequest,
) -> BoxStream<'static, RelayEvent>
where
    S: SessionStorage + 'static,
    P: CompletionProvider + 'static,
{
    async_stream::stream! {
        tracing::info!(session_id = %session_id, model = %request.model, "Sending request upstream");

        let mut deltas = match provider.stream_completion(request).await {
            Ok(deltas) => deltas,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Upstream request failed");
                yield RelayEvent::error(e);
                return;
            }
        };

        let mut reply = String::new();
        while let Some(next) = deltas.next().await {
            match next {
                Ok(delta) if delta.is_empty() => {}
                Ok(delta) => {
                    reply.push_str(&delta);
                    yield RelayEvent::chunk(delta);
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %session_id,
                        received = reply.len(),
                        error = %e,
                        "Upstream stream failed"
                    );
                    yield RelayEvent::error(e);
                    return;
                }
            }
        }

        match storage
            .append(&session_id, Role::Assistant, reply.clone())
            .await
        {
            Ok(()) => {
                tracing::info!(session_id = %session_id, reply_len = reply.len(), "Upstream replied successfully");
                yield RelayEvent::end(reply);
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to record assistant reply");
                yield RelayEvent::error(e);
            }
        }
    }
    .boxed()
}
