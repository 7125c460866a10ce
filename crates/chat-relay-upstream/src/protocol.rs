//! OpenAI-compatible chat completion wire types and SSE line parsing.

use chat_relay_core::{
    ChatMessage,
    traits::{CompletionRequest, UpstreamError},
};
use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl<'a> From<&'a CompletionRequest> for ChatCompletionRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Meaning of one line of the upstream event stream.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    /// Non-empty text to relay.
    Delta(String),
    /// `[DONE]` sentinel.
    Done,
    /// Comment, blank line, non-data field, or chunk without text.
    Skip,
}

/// Interpret one line of an SSE body.
///
/// # Errors
/// Returns [`UpstreamError::Decode`] for unparseable chunks and
/// [`UpstreamError::Api`] when upstream reports an error mid-stream.
pub fn parse_sse_line(line: &str) -> Result<SseLine, UpstreamError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| UpstreamError::Decode(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(UpstreamError::Api(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(SseLine::Skip, SseLine::Delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = CompletionRequest {
            model: "llama-3.3-70b-versatile".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: 2048,
        };

        let body = serde_json::to_value(ChatCompletionRequest::from(&request)).unwrap();
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_delta_line() {
        let line = r#"data: {"id":"x","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), SseLine::Delta("Hello".to_string()));
    }

    #[test]
    fn test_lines_without_text_are_skipped() {
        let role_only = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        let empty = r#"data: {"choices":[{"index":0,"delta":{"content":""}}]}"#;
        let finish = r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}],"x_groq":{"id":"req"}}"#;
        let no_choices = r#"data: {"choices":[]}"#;

        for line in [role_only, empty, finish, no_choices, "", ": ping", "event: message", "data:"] {
            assert_eq!(parse_sse_line(line).unwrap(), SseLine::Skip, "line: {line}");
        }
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), SseLine::Done);
        assert_eq!(parse_sse_line("data:[DONE]").unwrap(), SseLine::Done);
    }

    #[test]
    fn test_error_chunk() {
        let line = r#"data: {"error":{"message":"model overloaded","type":"server_error"}}"#;
        let err = parse_sse_line(line).unwrap_err();
        assert!(matches!(err, UpstreamError::Api(ref m) if m == "model overloaded"));
    }

    #[test]
    fn test_malformed_chunk() {
        let err = parse_sse_line("data: {not json").unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
    }
}
