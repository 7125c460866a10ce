//! Scripted completion provider for tests (requires `testing` feature).

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use futures::StreamExt;

use crate::traits::{CompletionProvider, CompletionRequest, DeltaStream, UpstreamError};

enum Reply {
    Stream {
        deltas: Vec<String>,
        failure: Option<String>,
    },
    Refuse {
        status: u16,
        body: String,
    },
}

/// Provider that plays back one scripted reply per call and records requests.
///
/// Calls beyond the script fail with [`UpstreamError::Api`].
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply that streams `deltas` and ends cleanly.
    #[must_use]
    pub fn reply(self, deltas: &[&str]) -> Self {
        self.push(Reply::Stream {
            deltas: deltas.iter().map(ToString::to_string).collect(),
            failure: None,
        })
    }

    /// Queue a reply that streams `deltas` and then breaks with a transport error.
    #[must_use]
    pub fn reply_then_fail(self, deltas: &[&str], message: &str) -> Self {
        self.push(Reply::Stream {
            deltas: deltas.iter().map(ToString::to_string).collect(),
            failure: Some(message.to_string()),
        })
    }

    /// Queue a refusal returned before any delta is produced.
    #[must_use]
    pub fn refuse(self, status: u16, body: &str) -> Self {
        self.push(Reply::Refuse {
            status,
            body: body.to_string(),
        })
    }

    /// Requests received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<DeltaStream, UpstreamError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Reply::Stream { deltas, failure }) => {
                let items = deltas
                    .into_iter()
                    .map(Ok)
                    .chain(failure.map(|m| Err(UpstreamError::Transport(m))));
                Ok(futures::stream::iter(items).boxed())
            }
            Some(Reply::Refuse { status, body }) => Err(UpstreamError::Status { status, body }),
            None => Err(UpstreamError::Api("no scripted reply left".to_string())),
        }
    }
}
