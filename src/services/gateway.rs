//! Model gateway: one chat completion call with a hard timeout, no retries
use crate::config::AssistantConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// How a chat call can fail. The interpreter folds every variant into a
/// placeholder reply; nothing here reaches the rendering collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat request timed out")]
    Timeout,
    #[error("chat endpoint returned an unusable response (status {status:?})")]
    BadResponse { status: Option<u16> },
    #[error("chat endpoint unreachable: {reason}")]
    Unreachable { reason: String },
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: String,
}

/// Single-attempt chat client. Retry policy, if any, belongs to the caller;
/// keeping this a one-shot primitive keeps turn latency bounded.
#[derive(Debug, Clone)]
pub struct ChatGateway {
    http: reqwest::Client,
}

impl ChatGateway {
    /// Build a gateway whose every request carries the configured wall-clock
    /// timeout.
    pub fn new(config: &AssistantConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http })
    }

    /// Send one system/user prompt pair and return the raw reply text.
    pub async fn send(
        &self,
        system: &str,
        user: &str,
        config: &AssistantConfig,
    ) -> Result<String, TransportError> {
        let request = ChatRequest {
            model: &config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_completion_tokens: config.max_completion_tokens,
            temperature: config.temperature,
            stream: false,
        };

        debug!(model = %config.model, endpoint = %config.endpoint, "sending chat request");

        let response = self
            .http
            .post(&config.endpoint)
            .header("api-key", &config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadResponse {
                status: Some(status.as_u16()),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::BadResponse { status: None }
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(TransportError::BadResponse { status: None })
    }
}

fn classify_send_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() || error.is_request() {
        TransportError::Unreachable {
            reason: error.to_string(),
        }
    } else {
        TransportError::BadResponse { status: None }
    }
}
