//! Completion transport for the generative model.
//!
//! The [`Completion`] trait decouples plan/code generation from the actual
//! model backend. Tests use scripted completions that return predetermined
//! text without touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::ModelConfig;

/// Abstraction over text-completion backends.
pub trait Completion {
    /// Return the model's completion for `prompt`. Errors are recoverable:
    /// callers degrade to fallback plans/templates.
    fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Blocking chat-completions client.
///
/// Requests block with no cancellation beyond the client timeout; a hang at
/// the transport level is an accepted external risk.
pub struct HttpCompletion {
    client: reqwest::blocking::Client,
    config: ModelConfig,
    api_key: String,
}

impl HttpCompletion {
    /// Build a client from config. A missing API key is not fatal: the
    /// request will fail and the caller's fallback path takes over.
    pub fn new(config: ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_else(|_| {
            warn!(
                var = %config.api_key_env,
                "no API key found; model requests will fail and fallbacks will be used"
            );
            String::new()
        });
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl Completion for HttpCompletion {
    #[instrument(skip_all, fields(model = %self.config.model, prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("send completion request")?
            .error_for_status()
            .context("completion request failed")?;

        let body: ChatResponse = response.json().context("parse completion response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("completion response had no choices"))?;

        debug!(bytes = content.len(), "received completion");
        Ok(content.trim().to_string())
    }
}
