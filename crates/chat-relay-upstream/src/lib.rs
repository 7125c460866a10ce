//! Upstream completion client for the chat gateway.
//!
//! Provides:
//! - OpenAI-compatible wire types and SSE line parsing
//! - `OpenAiCompatClient`, a streaming `CompletionProvider`

pub mod client;
pub mod protocol;

pub use client::{DEFAULT_BASE_URL, OpenAiCompatClient};
pub use protocol::{SseLine, parse_sse_line};
