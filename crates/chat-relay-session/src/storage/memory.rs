//! In-memory session storage.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use chat_relay_core::{
    Role, StoredMessage,
    message::unix_now,
    traits::{Session, SessionId, SessionStorage, StorageError},
};
use uuid::Uuid;

use crate::DEFAULT_SYSTEM_PROMPT;

/// In-memory storage implementation.
///
/// Useful for development and single-process deployments.
/// Sessions never expire; data is lost on restart.
pub struct MemoryStorage {
    sessions: RwLock<HashMap<SessionId, Session>>,
    system_prompt: String,
}

impl MemoryStorage {
    /// Create a new in-memory storage seeding sessions with the default prompt.
    #[must_use]
    pub fn new() -> Self {
        Self::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }

    /// Create a storage that seeds every new session with `system_prompt`.
    #[must_use]
    pub fn with_system_prompt(system_prompt: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            system_prompt: system_prompt.into(),
        }
    }

    /// Prompt used as the first message of new sessions.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Find the session, creating and seeding it when needed.
    fn resolve<'a>(
        &self,
        sessions: &'a mut HashMap<SessionId, Session>,
        session_id: Option<&str>,
    ) -> &'a mut Session {
        let id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => fresh_id(sessions),
        };

        sessions.entry(id).or_insert_with_key(|id| {
            tracing::debug!(session_id = %id, "Created session");
            let timestamp = unix_now();
            Session {
                id: id.clone(),
                messages: vec![StoredMessage::new(Role::System, self.system_prompt.clone())],
                created_at: timestamp,
                updated_at: timestamp,
            }
        })
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn fresh_id(sessions: &HashMap<SessionId, Session>) -> SessionId {
    loop {
        let id = Uuid::new_v4().to_string();
        if !sessions.contains_key(&id) {
            return id;
        }
    }
}

fn push_message(session: &mut Session, role: Role, content: String) {
    let msg = StoredMessage::new(role, content);
    session.updated_at = msg.created_at;
    session.messages.push(msg);
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get_or_create(
        &self,
        session_id: Option<&str>,
    ) -> Result<(SessionId, Vec<StoredMessage>), StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let session = self.resolve(&mut sessions, session_id);
        Ok((session.id.clone(), session.messages.clone()))
    }

    async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: String,
    ) -> Result<(), StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StorageError::NotFound(session_id.to_string()))?;

        push_message(session, role, content);

        Ok(())
    }

    async fn begin_turn(
        &self,
        session_id: Option<&str>,
        user_content: String,
    ) -> Result<(SessionId, Vec<StoredMessage>), StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let session = self.resolve(&mut sessions, session_id);
        push_message(session, Role::User, user_content);

        Ok((session.id.clone(), session.messages.clone()))
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StorageError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(session_id)
            .cloned())
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn roles(messages: &[StoredMessage]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_absent_id_creates_seeded_session() {
        let storage = MemoryStorage::with_system_prompt("be brief");

        let (id, history) = storage.get_or_create(None).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, "be brief");

        let (other, _) = storage.get_or_create(Some("")).await.unwrap();
        assert_ne!(id, other);
        assert_eq!(storage.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_caller_id_is_kept() {
        let storage = MemoryStorage::new();

        let (id, history) = storage.get_or_create(Some("abc")).await.unwrap();
        assert_eq!(id, "abc");
        assert_eq!(history[0].content, DEFAULT_SYSTEM_PROMPT);

        storage
            .append("abc", Role::User, "hello".to_string())
            .await
            .unwrap();

        let (again, history) = storage.get_or_create(Some("abc")).await.unwrap();
        assert_eq!(again, "abc");
        assert_eq!(roles(&history), vec![Role::System, Role::User]);
        assert_eq!(storage.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_append_to_unknown_session_fails() {
        let storage = MemoryStorage::new();
        let err = storage
            .append("missing", Role::Assistant, "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "missing"));
        assert!(storage.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_begin_turn_appends_user_message() {
        let storage = MemoryStorage::new();

        let (id, history) = storage
            .begin_turn(None, "first".to_string())
            .await
            .unwrap();
        assert_eq!(roles(&history), vec![Role::System, Role::User]);

        storage
            .append(&id, Role::Assistant, "reply".to_string())
            .await
            .unwrap();

        let (same, history) = storage
            .begin_turn(Some(&id), "second".to_string())
            .await
            .unwrap();
        assert_eq!(same, id);
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec![DEFAULT_SYSTEM_PROMPT, "first", "reply", "second"]);

        let session = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(session.messages, history);
        assert!(session.updated_at >= session.created_at);
    }

    #[tokio::test]
    async fn test_concurrent_turns_lose_no_messages() {
        let storage = Arc::new(MemoryStorage::new());
        storage.get_or_create(Some("shared")).await.unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let storage = Arc::clone(&storage);
                tokio::spawn(async move {
                    storage
                        .begin_turn(Some("shared"), format!("msg {i}"))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let session = storage.get("shared").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 33);
        assert_eq!(
            session.messages.iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }

    #[test]
    fn test_get_unknown_is_none() {
        let storage = MemoryStorage::new();
        let session = tokio_test::block_on(storage.get("nope")).unwrap();
        assert!(session.is_none());
    }
}
