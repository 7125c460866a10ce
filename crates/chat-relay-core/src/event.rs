//! Events streamed back to the caller during a relay.

use serde::{Deserialize, Serialize};

/// One server-sent event of a chat turn.
///
/// A turn emits zero or more `Chunk`s followed by exactly one
/// terminal event (`End` or `Error`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// Incremental text from upstream.
    Chunk { content: String },
    /// Full assistant reply, sent once the upstream stream ends cleanly.
    End { content: String },
    /// Human-readable failure description.
    Error { message: String },
}

impl RelayEvent {
    #[must_use]
    pub fn chunk(content: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn end(content: impl Into<String>) -> Self {
        Self::End {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// Whether this event closes the turn.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. } | Self::Error { .. })
    }

    /// JSON payload carried on the `data:` line.
    #[must_use]
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            // Only string fields; kept total so a stream never loses its terminal event.
            Err(e) => format!(r#"{{"type":"error","message":"serialization failed: {e}"}}"#),
        }
    }

    /// Convert to an axum SSE event (requires `sse` feature).
    #[cfg(feature = "sse")]
    #[must_use]
    pub fn to_sse_event(&self) -> axum::response::sse::Event {
        axum::response::sse::Event::default().data(self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        assert_eq!(
            RelayEvent::chunk("Hel").to_json(),
            r#"{"type":"chunk","content":"Hel"}"#
        );
        assert_eq!(
            RelayEvent::end("Hello").to_json(),
            r#"{"type":"end","content":"Hello"}"#
        );
        assert_eq!(
            RelayEvent::error("boom").to_json(),
            r#"{"type":"error","message":"boom"}"#
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(!RelayEvent::chunk("x").is_terminal());
        assert!(RelayEvent::end("x").is_terminal());
        assert!(RelayEvent::error("x").is_terminal());
    }

    #[test]
    fn test_parse_from_wire() {
        let parsed: RelayEvent =
            serde_json::from_str(r#"{"type":"error","message":"upstream down"}"#).unwrap();
        assert_eq!(parsed, RelayEvent::error("upstream down"));
    }
}
