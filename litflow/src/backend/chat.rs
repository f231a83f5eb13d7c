//! API-backed generation adapter for streaming chat completions.
//!
//! Opens one streaming `/v1/chat/completions` request per call and parses
//! the server-sent-event body into backend chunks. Sampling parameters are
//! adapter configuration, never caller-supplied.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChunkStream, GenerationBackend};
use crate::core::BackendChunk;
use crate::errors::BackendError;

/// Configuration for the chat-completions adapter.
#[derive(Debug, Clone)]
pub struct ChatBackendConfig {
    /// API base URL, e.g. `https://api.deepseek.com` (no trailing slash).
    pub base_url: String,
    /// Bearer token for the API.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output length in tokens.
    pub max_tokens: u32,
}

impl ChatBackendConfig {
    /// Creates a config with the crate's default sampling parameters.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.8,
            max_tokens: 4096,
        }
    }
}

/// Generation backend driving a hosted streaming chat-completion API.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    config: ChatBackendConfig,
    client: reqwest::Client,
}

impl ChatCompletionsBackend {
    /// Creates a new backend with its own HTTP client.
    #[must_use]
    pub fn new(config: ChatBackendConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Creates a new backend sharing an existing HTTP client pool.
    #[must_use]
    pub fn with_client(config: ChatBackendConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn build_request(&self, prompt: &str, system_prompt: Option<&str>) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt {
            messages.push(ChatMessage {
                role: ChatRole::System,
                content: sys.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: ChatRole::User,
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    fn name(&self) -> &str {
        "chat"
    }

    async fn stream(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChunkStream, BackendError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let request = self.build_request(prompt, system_prompt);

        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut body = Box::pin(response.bytes_stream());

        let stream = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            let mut accumulator = String::new();

            'body: while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(BackendError::Http)?;
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim_end();

                    let Some(data) = line.strip_prefix("data:") else { continue };
                    let data = data.trim();
                    if data == "[DONE]" {
                        break 'body;
                    }
                    if let Some(text) = parse_content_delta(data) {
                        if !text.is_empty() {
                            accumulator.push_str(&text);
                            yield BackendChunk::Delta(text);
                        }
                    }
                }
            }

            yield BackendChunk::Complete(accumulator);
        };

        Ok(Box::pin(stream))
    }
}

/// Extracts the content fragment from one streamed completion chunk.
fn parse_content_delta(data: &str) -> Option<String> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data).ok()?;
    chunk.choices.into_iter().next()?.delta.content
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: ChatRole,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn backend_for(base_url: String) -> ChatCompletionsBackend {
        ChatCompletionsBackend::new(ChatBackendConfig::new(base_url, "test-key", "test-model"))
    }

    fn sse_body(fragments: &[&str]) -> String {
        let mut body = String::new();
        for fragment in fragments {
            let chunk = serde_json::json!({
                "choices": [{ "index": 0, "delta": { "content": fragment } }],
            });
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[test]
    fn test_parse_content_delta() {
        let data = r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#;
        assert_eq!(parse_content_delta(data), Some("Hi".to_string()));

        // Role-only first chunk has no content.
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_content_delta(data), None);

        assert_eq!(parse_content_delta("not json"), None);
    }

    #[test]
    fn test_build_request_with_system_prompt() {
        let backend = backend_for("http://localhost".to_string());
        let request = backend.build_request("write it", Some("you are a poet"));

        assert_eq!(request.messages.len(), 2);
        assert!(matches!(request.messages[0].role, ChatRole::System));
        assert_eq!(request.messages[0].content, "you are a poet");
        assert!(matches!(request.messages[1].role, ChatRole::User));
        assert!(request.stream);
        assert_eq!(request.max_tokens, 4096);
    }

    #[test]
    fn test_build_request_without_system_prompt() {
        let backend = backend_for("http://localhost".to_string());
        let request = backend.build_request("write it", None);
        assert_eq!(request.messages.len(), 1);
        assert!(matches!(request.messages[0].role, ChatRole::User));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = ChatBackendConfig::new("https://api.example.com/", "k", "m");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[tokio::test]
    async fn test_accumulator_matches_concatenated_deltas() {
        let server = MockServer::start_async().await;
        let _mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer test-key");
                then.status(200)
                    .header("Content-Type", "text/event-stream")
                    .body(sse_body(&["The ", "quick ", "fox"]));
            })
            .await;

        let backend = backend_for(server.base_url());
        let mut chunks = backend.stream("topic", None).await.unwrap();

        let mut deltas = String::new();
        let mut complete = None;
        while let Some(chunk) = chunks.next().await {
            match chunk.unwrap() {
                BackendChunk::Delta(text) => deltas.push_str(&text),
                BackendChunk::Complete(text) => complete = Some(text),
            }
        }

        assert_eq!(deltas, "The quick fox");
        assert_eq!(complete.as_deref(), Some("The quick fox"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        let _mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body(r#"{"error":"invalid_api_key"}"#);
            })
            .await;

        let backend = backend_for(server.base_url());
        let Err(err) = backend.stream("topic", None).await else {
            panic!("expected the request to fail");
        };
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("invalid_api_key"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_stream_completes_with_empty_text() {
        let server = MockServer::start_async().await;
        let _mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("data: [DONE]\n\n");
            })
            .await;

        let backend = backend_for(server.base_url());
        let mut chunks = backend.stream("topic", None).await.unwrap();
        let chunk = chunks.next().await.unwrap().unwrap();
        assert_eq!(chunk, BackendChunk::Complete(String::new()));
        assert!(chunks.next().await.is_none());
    }
}
