//! Text-generation capability
//!
//! The assistant delegates every "AI" answer to a completion client.
//! Implementations may be hosted or local; callers only see text or an
//! upstream error. One attempt per call, no retries.

use crate::config::{InferenceConfig, DEFAULT_MAX_NEW_TOKENS};
use crate::error::AssistantError;
use crate::Result;
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub mod hosted;
pub use hosted::HostedInferenceClient;

/// Chunks of generated text, in order. Dropping the stream abandons the call.
pub type TextStream = BoxStream<'static, Result<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, config: &InferenceConfig) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens: config.max_new_tokens.unwrap_or(DEFAULT_MAX_NEW_TOKENS),
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single round trip; returns the whole generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Incremental variant of `complete`.
    async fn complete_stream(&self, request: &CompletionRequest) -> Result<TextStream>;
}

/// Stand-in used when no API token is configured. Every call fails, so
/// generative features degrade to their fallback text.
pub struct UnconfiguredClient;

#[async_trait]
impl CompletionClient for UnconfiguredClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Err(AssistantError::UpstreamError(
            "inference token not configured".to_string(),
        ))
    }

    async fn complete_stream(&self, _request: &CompletionRequest) -> Result<TextStream> {
        Err(AssistantError::UpstreamError(
            "inference token not configured".to_string(),
        ))
    }
}

/// Pick the hosted client when a token is present, otherwise the stand-in.
pub fn client_from_config(config: &InferenceConfig) -> Arc<dyn CompletionClient> {
    if config.api_token.is_none() {
        warn!("No inference token set; generative features will use fallback text");
        return Arc::new(UnconfiguredClient);
    }

    match HostedInferenceClient::new(config) {
        Ok(client) => {
            info!(model = client.model(), "Hosted inference client ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!("Failed to build inference client, using fallback text: {}", e);
            Arc::new(UnconfiguredClient)
        }
    }
}

//
// ================= Stream Accumulation =================
//

#[derive(Debug)]
pub enum StreamEnd {
    Completed,
    Cancelled,
    Failed(AssistantError),
}

#[derive(Debug)]
pub struct StreamOutcome {
    /// Concatenation of every chunk received before the stream ended.
    pub text: String,
    pub end: StreamEnd,
}

enum Step {
    Next(Option<Result<String>>),
    Recheck,
    CancelDropped,
}

/// Drain a text stream into one string, handing each chunk to `on_chunk`
/// as it arrives. Stops at end of stream, on the first error, or as soon
/// as the cancel flag turns true.
pub async fn accumulate<F>(
    mut stream: TextStream,
    mut cancel: Option<watch::Receiver<bool>>,
    mut on_chunk: F,
) -> StreamOutcome
where
    F: FnMut(&str),
{
    let mut text = String::new();

    loop {
        let step = match cancel.as_mut() {
            Some(rx) => {
                if *rx.borrow() {
                    debug!(chars = text.len(), "Stream cancelled");
                    return StreamOutcome {
                        text,
                        end: StreamEnd::Cancelled,
                    };
                }
                tokio::select! {
                    biased;
                    changed = rx.changed() => {
                        if changed.is_err() { Step::CancelDropped } else { Step::Recheck }
                    }
                    chunk = stream.next() => Step::Next(chunk),
                }
            }
            None => Step::Next(stream.next().await),
        };

        match step {
            Step::Recheck => continue,
            // Nobody can cancel any more; read to the end.
            Step::CancelDropped => cancel = None,
            Step::Next(None) => {
                return StreamOutcome {
                    text,
                    end: StreamEnd::Completed,
                }
            }
            Step::Next(Some(Ok(chunk))) => {
                on_chunk(&chunk);
                text.push_str(&chunk);
            }
            Step::Next(Some(Err(e))) => {
                warn!("Stream failed after {} chars: {}", text.len(), e);
                return StreamOutcome {
                    text,
                    end: StreamEnd::Failed(e),
                };
            }
        }
    }
}
