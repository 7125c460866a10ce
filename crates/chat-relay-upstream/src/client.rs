//! Streaming client for OpenAI-compatible chat completion endpoints.

use async_trait::async_trait;
use chat_relay_core::traits::{CompletionProvider, CompletionRequest, DeltaStream, UpstreamError};
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::protocol::{ChatCompletionRequest, SseLine, parse_sse_line};

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Chat completion client speaking the OpenAI streaming protocol.
///
/// A missing API key is not validated locally; requests go out without
/// credentials and upstream rejects them.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    /// Create a client for the default base URL.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Point the client at another OpenAI-compatible API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API root requests are sent under.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatClient {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, UpstreamError> {
        let url = self.completions_url();
        tracing::debug!(
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "Opening completion stream"
        );

        let mut builder = self
            .client
            .post(&url)
            .json(&ChatCompletionRequest::from(&request));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!(status = %status, body = %body, "Upstream API error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let byte_stream = response.bytes_stream();
        let stream_reader =
            StreamReader::new(byte_stream.map(|result| result.map_err(std::io::Error::other)));
        let buf_reader = tokio::io::BufReader::new(stream_reader);

        let stream = async_stream::try_stream! {
            let mut lines = buf_reader.lines();

            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?
            {
                match parse_sse_line(&line)? {
                    SseLine::Delta(text) => yield text,
                    SseLine::Done => break,
                    SseLine::Skip => {}
                }
            }
        };

        let deltas: DeltaStream = Box::pin(stream);
        Ok(deltas)
    }
}
