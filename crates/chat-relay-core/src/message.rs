//! Chat messages and their stored form.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions seeded at session creation.
    System,
    /// Text supplied by the caller.
    User,
    /// Reply assembled from the upstream stream.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (role, content) pair, exactly as forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A message as held by a session store.
///
/// Carries bookkeeping that upstream APIs reject, so it is never
/// serialized onto the wire directly. Use [`project_transcript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    /// Append time (Unix epoch seconds).
    pub created_at: i64,
}

impl StoredMessage {
    /// Stamp a new message with the current time.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: unix_now(),
        }
    }

    /// Strip bookkeeping, keeping only role and content.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Build the clean (role, content) transcript sent upstream.
#[must_use]
pub fn project_transcript(stored: &[StoredMessage]) -> Vec<ChatMessage> {
    stored.iter().map(StoredMessage::to_chat_message).collect()
}

/// Current time in Unix epoch seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::System.to_string(), "system");

        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_projection_drops_timestamps() {
        let stored = vec![
            StoredMessage::new(Role::System, "be nice"),
            StoredMessage::new(Role::User, "hi"),
        ];

        let transcript = project_transcript(&stored);
        assert_eq!(
            transcript,
            vec![ChatMessage::system("be nice"), ChatMessage::user("hi")]
        );

        let value = serde_json::to_value(&transcript[1]).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"role"));
        assert!(keys.contains(&"content"));
    }

    #[test]
    fn test_stored_message_is_stamped() {
        let msg = StoredMessage::new(Role::User, "hello");
        assert!(msg.created_at > 0);
    }
}
