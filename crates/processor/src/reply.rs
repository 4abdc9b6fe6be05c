//! AI-generated sales replies
//!
//! Every reply is generated from a single turn: the fixed system prompt,
//! whatever history the caller passes (currently always none) and the
//! user's message.

use async_trait::async_trait;
use common::models::ChatTurn;
use common::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Returned instead of a generated reply when no API key is configured
pub const MISSING_API_KEY_REPLY: &str = "OpenAI API key not set.";

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 400;

const SYSTEM_PROMPT: &str = "You are a professional sales assistant for Instagram. \
Briefly identify the customer's needs, suggest a relevant solution and make a soft call to action. \
If needed, ask 1-2 clarifying questions. Respond in a friendly and confident tone.";

#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OpenAI API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("OpenAI returned no choices")]
    EmptyResponse,
}

/// Produces a reply to an inbound direct message
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, text: &str, history: &[ChatTurn]) -> common::Result<String>;
}

/// OpenAI chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI chat response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Reply generator backed by the OpenAI chat completions API
pub struct OpenAiReplyGenerator {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiReplyGenerator {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReplyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ReplyError> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
            Duration::from_secs(config.openai_timeout_secs),
        )
    }

    /// Generate a reply, or the fixed fallback text when no key is set
    pub async fn generate_reply(
        &self,
        user_text: &str,
        history: &[ChatTurn],
    ) -> Result<String, ReplyError> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return Ok(MISSING_API_KEY_REPLY.to_string()),
        };

        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(user_text, history),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, turns = request.messages.len(), "Requesting chat completion");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ReplyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(ReplyError::EmptyResponse)?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiReplyGenerator {
    async fn generate(&self, text: &str, history: &[ChatTurn]) -> common::Result<String> {
        self.generate_reply(text, history)
            .await
            .map_err(|e| common::Error::ChatCompletion(e.to_string()))
    }
}

/// System prompt, then prior turns, then the user's message
fn build_messages(user_text: &str, history: &[ChatTurn]) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::system(SYSTEM_PROMPT));
    messages.extend_from_slice(history);
    messages.push(ChatTurn::user(user_text));
    messages
}
