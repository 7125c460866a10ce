//! Core abstractions for the chat relay gateway.
//!
//! This crate provides the fundamental building blocks:
//! - `ChatMessage` / `StoredMessage` - Conversation history entries
//! - `RelayEvent` - Typed event enum streamed back to callers
//! - `SessionStorage` and `CompletionProvider` traits

pub mod event;
pub mod message;
pub mod traits;

#[cfg(feature = "testing")]
pub mod testing;

pub use event::RelayEvent;
pub use message::{ChatMessage, Role, StoredMessage, project_transcript};
pub use traits::{CompletionProvider, SessionStorage};
