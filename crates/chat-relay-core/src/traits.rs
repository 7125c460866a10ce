//! Core traits for session storage and upstream completion.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ChatMessage, Role, StoredMessage};

/// Session identifier. Opaque; caller-chosen or generated.
pub type SessionId = String;

/// A conversation held by a session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Ordered history, starting with the system message.
    pub messages: Vec<StoredMessage>,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: i64,
    /// Last append timestamp.
    pub updated_at: i64,
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for session storage backends.
///
/// Sessions are created on first reference and only ever grow by append.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Resolve a session, creating it when the id is absent, empty or unseen.
    ///
    /// New sessions are seeded with exactly one system message. Returns the
    /// resolved id and a snapshot of the history.
    async fn get_or_create(
        &self,
        session_id: Option<&str>,
    ) -> Result<(SessionId, Vec<StoredMessage>), StorageError>;

    /// Append one message to the end of an existing session.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] if the session does not exist.
    async fn append(&self, session_id: &str, role: Role, content: String)
    -> Result<(), StorageError>;

    /// Resolve a session and record the user's message.
    ///
    /// Returns the resolved id and the history including the new message.
    /// The default runs two separate operations; backends should override
    /// it with an atomic version.
    async fn begin_turn(
        &self,
        session_id: Option<&str>,
        user_content: String,
    ) -> Result<(SessionId, Vec<StoredMessage>), StorageError> {
        let (id, mut history) = self.get_or_create(session_id).await?;
        self.append(&id, Role::User, user_content.clone()).await?;
        history.push(StoredMessage::new(Role::User, user_content));
        Ok((id, history))
    }

    /// Get a session by ID.
    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize, StorageError>;

    /// Whether no session has been created yet.
    async fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len().await? == 0)
    }
}

/// A streaming chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Incremental text deltas from an upstream completion.
pub type DeltaStream = BoxStream<'static, Result<String, UpstreamError>>;

/// Failure talking to the upstream completion API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upstream API error: {0}")]
    Api(String),
    #[error("Malformed upstream response: {0}")]
    Decode(String),
}

/// Trait for upstream completion services.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streaming completion.
    ///
    /// Errors raised before the first delta are returned directly; later
    /// ones arrive as items of the stream.
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, UpstreamError>;
}
