//! HTTP transport for the chat gateway.
//!
//! Provides:
//! - Wire protocol (JSON request bodies, SSE event payloads)
//! - Axum router exposing the liveness and chat endpoints

pub mod http;
pub mod protocol;

pub use http::{SESSION_ID_HEADER, create_chat_router};
pub use protocol::{ChatRequest, ErrorResponse, StatusResponse};
