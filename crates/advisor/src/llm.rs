//! Chat-completion client abstraction and the OpenAI-compatible implementation.
//!
//! Streaming forwards each content delta to a sink in arrival order while
//! accumulating the full text. A sink whose receiver is gone stops the read,
//! which is how a client disconnect propagates upstream.

use std::io::{BufRead, BufReader};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const TEMPERATURE: f32 = 0.3;
pub const MAX_TOKENS: u32 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("API request failed: {0}")]
    Http(String),

    #[error("failed to read API response: {0}")]
    Read(String),

    #[error("failed to parse API response: {0}")]
    Parse(String),

    #[error("task join error: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One-shot completion; returns the full text.
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError>;

    /// Streamed completion. Each content delta is sent to `sink` as it
    /// arrives; the accumulated text is returned at the end.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        sink: mpsc::Sender<String>,
    ) -> Result<String, LlmError>;
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    delta: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One line of a `text/event-stream` body.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    /// A content delta.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
    /// Blank lines, comments, role-only or empty deltas.
    Skip,
}

/// Interpret one SSE line from a streamed chat completion.
pub fn parse_sse_line(line: &str) -> Result<SseLine, LlmError> {
    let Some(data) = line.trim_end().strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }
    let chunk: CompletionResponse =
        serde_json::from_str(data).map_err(|e| LlmError::Parse(e.to_string()))?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|c| !c.is_empty());
    Ok(content.map(SseLine::Delta).unwrap_or(SseLine::Skip))
}

/// Read an SSE body, forwarding deltas. Stops early when the sink closes.
pub fn pump_sse<R: BufRead>(reader: R, sink: &mpsc::Sender<String>) -> Result<String, LlmError> {
    let mut full = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| LlmError::Read(e.to_string()))?;
        match parse_sse_line(&line)? {
            SseLine::Delta(delta) => {
                full.push_str(&delta);
                if sink.blocking_send(delta).is_err() {
                    debug!("stream consumer went away; stopping read");
                    break;
                }
            }
            SseLine::Done => break,
            SseLine::Skip => {}
        }
    }
    Ok(full)
}

// ── OpenAI client ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> Result<String, LlmError> {
        self.config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)
    }

    fn post(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        model: &str,
        stream: bool,
    ) -> Result<ureq::http::Response<ureq::Body>, LlmError> {
        let body = CompletionRequest {
            model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        };
        let agent = ureq::Agent::new_with_defaults();
        agent
            .post(&self.endpoint())
            .header("authorization", &format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .send_json(&body)
            .map_err(|e| LlmError::Http(e.to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let client = self.clone();
        let messages = messages.to_vec();
        let model = model.to_string();

        tokio::task::spawn_blocking(move || {
            let response = client.post(&api_key, &messages, &model, false)?;
            let resp: CompletionResponse = response
                .into_body()
                .read_json()
                .map_err(|e| LlmError::Parse(e.to_string()))?;
            resp.choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content)
                .ok_or_else(|| LlmError::Parse("response contained no text content".to_string()))
        })
        .await
        .map_err(|e| LlmError::Join(e.to_string()))?
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        sink: mpsc::Sender<String>,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let client = self.clone();
        let messages = messages.to_vec();
        let model = model.to_string();

        info!(%model, "streaming chat completion");

        tokio::task::spawn_blocking(move || {
            let response = client.post(&api_key, &messages, &model, true)?;
            let reader = BufReader::new(response.into_body().into_reader());
            pump_sse(reader, &sink)
        })
        .await
        .map_err(|e| LlmError::Join(e.to_string()))?
    }
}
