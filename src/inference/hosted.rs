//! Hosted text-generation client
//!
//! Talks to a Hugging Face style inference endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{CompletionClient, CompletionRequest, TextStream};
use crate::config::InferenceConfig;
use crate::error::AssistantError;
use crate::Result;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{error, info};

/// Reusable inference client (connection-pooled)
pub struct HostedInferenceClient {
    client: Client,
    api_token: String,
    base_url: String,
    model: String,
}

impl HostedInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| {
            AssistantError::ConfigError("HF_API_TOKEN not configured".to_string())
        })?;

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<reqwest::Response> {
        let body = GenerationRequest {
            inputs: &request.prompt,
            parameters: GenerationParameters {
                max_new_tokens: request.max_new_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                return_full_text: false,
            },
            stream,
        };

        info!(model = %self.model, stream, "Calling inference endpoint");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Inference request failed: {}", e);
                AssistantError::UpstreamError(format!("inference request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Inference error response: {}", error_text);
            return Err(AssistantError::UpstreamError(format!(
                "inference endpoint returned {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for HostedInferenceClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self.send(request, false).await?;

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse inference response: {}", e);
            AssistantError::MalformedResponse(format!("response is not JSON: {}", e))
        })?;

        let text = extract_generated_text(&body)?;
        info!(chars = text.len(), "Inference response received");
        Ok(text)
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<TextStream> {
        let response = self.send(request, true).await?;

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(sse_text_stream(body))
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    token: Option<StreamToken>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamToken {
    text: String,
    #[serde(default)]
    special: bool,
}

/// Pull the generated text out of any of the shapes the endpoint returns:
/// a bare string, `{"generated_text"}` / `{"text"}`, or a list of those.
pub fn extract_generated_text(body: &Value) -> Result<String> {
    match body {
        Value::Array(items) => match items.first() {
            Some(first @ (Value::String(_) | Value::Object(_))) => extract_generated_text(first),
            Some(other) => Err(AssistantError::MalformedResponse(format!(
                "unexpected list element: {}",
                other
            ))),
            None => Err(AssistantError::MalformedResponse(
                "empty result list".to_string(),
            )),
        },
        Value::String(text) => Ok(text.clone()),
        Value::Object(map) => {
            if let Some(message) = map.get("error").and_then(Value::as_str) {
                return Err(AssistantError::UpstreamError(message.to_string()));
            }
            map.get("generated_text")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    AssistantError::MalformedResponse(format!("no generated text in {}", body))
                })
        }
        other => Err(AssistantError::MalformedResponse(format!(
            "unexpected response: {}",
            other
        ))),
    }
}

/// Decode one `data:` payload. `Ok(None)` means nothing to show (special
/// or empty token).
fn parse_stream_event(payload: &str) -> Result<Option<String>> {
    let event: StreamEvent = serde_json::from_str(payload).map_err(|e| {
        AssistantError::MalformedResponse(format!("bad stream event: {}", e))
    })?;

    if let Some(message) = event.error {
        return Err(AssistantError::UpstreamError(message));
    }

    Ok(event
        .token
        .filter(|t| !t.special && !t.text.is_empty())
        .map(|t| t.text))
}

struct SseState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    done: bool,
}

impl SseState {
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
            if self.done {
                return;
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        let Some(payload) = line.trim().strip_prefix("data:") else {
            return;
        };
        let payload = payload.trim();

        if payload == "[DONE]" {
            self.done = true;
            return;
        }

        match parse_stream_event(payload) {
            Ok(Some(text)) => self.pending.push_back(Ok(text)),
            Ok(None) => {}
            Err(e) => {
                self.pending.push_back(Err(e));
                self.done = true;
            }
        }
    }
}

/// Turn a server-sent-events body into a stream of token texts.
fn sse_text_stream(body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> TextStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(&bytes);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.pending.push_back(Err(AssistantError::UpstreamError(format!(
                        "stream interrupted: {}",
                        e
                    ))));
                }
                None => {
                    // Body ended; a final line may lack its newline.
                    state.buffer.push(b'\n');
                    state.drain_lines();
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::accumulate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> InferenceConfig {
        InferenceConfig {
            api_token: Some("hf_test".to_string()),
            base_url: server.uri(),
            model: "test-model".to_string(),
            ..InferenceConfig::default()
        }
    }

    #[test]
    fn test_extract_generated_text_shapes() {
        assert_eq!(extract_generated_text(&json!("plain")).unwrap(), "plain");
        assert_eq!(
            extract_generated_text(&json!({"generated_text": "a"})).unwrap(),
            "a"
        );
        assert_eq!(extract_generated_text(&json!({"text": "b"})).unwrap(), "b");
        assert_eq!(
            extract_generated_text(&json!([{"generated_text": "c"}])).unwrap(),
            "c"
        );
        assert_eq!(extract_generated_text(&json!(["d"])).unwrap(), "d");
    }

    #[test]
    fn test_extract_generated_text_rejects_odd_shapes() {
        for body in [json!([]), json!(42), json!({"foo": 1}), json!([[1]]), json!(null)] {
            let err = extract_generated_text(&body).unwrap_err();
            assert!(matches!(err, AssistantError::MalformedResponse(_)), "{}", body);
        }
        let err = extract_generated_text(&json!({"error": "Model is loading"})).unwrap_err();
        assert!(matches!(err, AssistantError::UpstreamError(_)));
    }

    #[test]
    fn test_parse_stream_event() {
        let text = parse_stream_event(r#"{"token":{"id":1,"text":"Hi","special":false}}"#).unwrap();
        assert_eq!(text.as_deref(), Some("Hi"));

        let special = parse_stream_event(r#"{"token":{"text":"</s>","special":true}}"#).unwrap();
        assert!(special.is_none());

        assert!(parse_stream_event(r#"{"error":"overloaded"}"#).is_err());
        assert!(parse_stream_event("not json").is_err());
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerationRequest {
            inputs: "What is SIP?",
            parameters: GenerationParameters {
                max_new_tokens: 700,
                temperature: 0.6,
                top_p: 0.95,
                return_full_text: false,
            },
            stream: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["inputs"], "What is SIP?");
        assert_eq!(json["parameters"]["max_new_tokens"], 700);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }

    #[test]
    fn test_new_requires_token() {
        assert!(HostedInferenceClient::new(&InferenceConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_complete_against_mock_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(json!({"parameters": {"max_new_tokens": 64}})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"generated_text": "Start an index fund SIP."}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HostedInferenceClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.model(), "test-model");
        let request =
            CompletionRequest::new("advice", &InferenceConfig::default()).with_max_new_tokens(64);

        let text = client.complete(&request).await.unwrap();
        assert_eq!(text, "Start an index fund SIP.");
    }

    #[tokio::test]
    async fn test_complete_maps_http_failure_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = HostedInferenceClient::new(&config_for(&server)).unwrap();
        let request = CompletionRequest::new("advice", &InferenceConfig::default());

        let err = client.complete(&request).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_complete_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
            .mount(&server)
            .await;

        let client = HostedInferenceClient::new(&config_for(&server)).unwrap();
        let request = CompletionRequest::new("advice", &InferenceConfig::default());

        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, AssistantError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_stream_reads_server_sent_events() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"token\":{\"text\":\"Track \",\"special\":false}}\n\n",
            "data: {\"token\":{\"text\":\"every \",\"special\":false}}\n\n",
            "data: {\"token\":{\"text\":\"rupee.\",\"special\":false}}\n\n",
            "data: {\"token\":{\"text\":\"</s>\",\"special\":true}}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let client = HostedInferenceClient::new(&config_for(&server)).unwrap();
        let request = CompletionRequest::new("tip", &InferenceConfig::default());

        let stream = client.complete_stream(&request).await.unwrap();
        let outcome = accumulate(stream, None, |_| {}).await;
        assert_eq!(outcome.text, "Track every rupee.");
        assert!(matches!(outcome.end, crate::inference::StreamEnd::Completed));
    }

    #[tokio::test]
    async fn test_sse_stream_handles_split_lines_and_missing_trailing_newline() {
        let parts: Vec<reqwest::Result<Vec<u8>>> = vec![
            Ok(b"data: {\"token\":{\"te".to_vec()),
            Ok(b"xt\":\"one \"}}\ndata: {\"token\":{\"text\":\"two\"}}".to_vec()),
        ];
        let text_stream = sse_text_stream(stream::iter(parts).boxed());

        let outcome = accumulate(text_stream, None, |_| {}).await;
        assert_eq!(outcome.text, "one two");
    }
}
