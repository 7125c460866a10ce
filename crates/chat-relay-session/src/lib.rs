//! Session storage and relay orchestration for the chat gateway.
//!
//! Provides:
//! - `SessionManager` - Run a chat turn against storage and an upstream provider
//! - Storage implementations (memory)

pub mod manager;
pub mod storage;

pub use manager::{ManagerError, SessionManager, Turn, TurnRequest};

/// First message of every new session unless configured otherwise.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and friendly AI assistant.";
