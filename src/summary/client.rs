//! Chat-completion HTTP client.
//!
//! One synchronous round trip to an OpenAI-compatible endpoint: the
//! composed instruction goes in the system role, the rendered data block
//! in the user role. Temperature is pinned low so the model favors
//! fact-hewing completions over creative variation. No retry, no
//! streaming; transport and endpoint errors map to typed variants the
//! orchestrator folds into a displayable failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Low temperature for deterministic, fact-hewing output.
const COMPLETION_TEMPERATURE: f64 = 0.3;

/// reqwest has no default timeout; a ceiling is pinned at construction.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("No API key configured — set CHARTBRIEF_API_KEY")]
    MissingApiKey,

    #[error("Cannot reach completion endpoint at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Completion endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Failed to parse completion response: {0}")]
    ResponseParsing(String),

    #[error("Completion response contained no choices")]
    EmptyResponse,
}

/// The seam between the pipeline and the external completion service.
/// Production uses [`ChatCompletionClient`]; tests inject a mock.
pub trait CompletionBackend {
    /// One blocking completion call: `system` instruction + `user` data
    /// block in, first choice's trimmed text out.
    fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
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
            temperature: COMPLETION_TEMPERATURE,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl CompletionBackend for ChatCompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(system, user);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    CompletionError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    CompletionError::Timeout(self.timeout_secs)
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| CompletionError::ResponseParsing(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(choice.message.content.trim().to_string())
    }
}

/// Mock backend for tests — canned response or forced failure, with the
/// last prompts captured for inspection.
#[cfg(test)]
pub struct MockCompletionClient {
    response: Result<String, String>,
    pub captured: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl MockCompletionClient {
    pub fn replying(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            captured: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(diagnostic: &str) -> Self {
        Self {
            response: Err(diagnostic.to_string()),
            captured: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.captured
            .lock()
            .unwrap()
            .last()
            .map(|(_, user)| user.clone())
    }

    pub fn last_system_prompt(&self) -> Option<String> {
        self.captured
            .lock()
            .unwrap()
            .last()
            .map(|(system, _)| system.clone())
    }
}

#[cfg(test)]
impl CompletionBackend for MockCompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        self.captured
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        match &self.response {
            Ok(text) => Ok(text.trim().to_string()),
            Err(diag) => Err(CompletionError::Transport(diag.clone())),
        }
    }
}
