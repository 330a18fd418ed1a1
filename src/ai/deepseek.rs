//! DeepSeek API Client
//!
//! OpenAI-compatible chat completions endpoint. One system and one user
//! message per call with fixed sampling limits.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::prompts::instruction;
use super::{AiClient, AiError, Mode, Profile};
use crate::config::Config;

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 1600;

/// DeepSeek API client
#[derive(Clone)]
pub struct DeepSeekClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

/// Message in a chat request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// API request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// API response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl ChatResponse {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl DeepSeekClient {
    pub fn new(
        api_key: Option<&str>,
        api_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.map(|s| s.to_string()),
            api_url: api_url.to_string(),
            model: model.to_string(),
        })
    }

    /// Create from config
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        Self::new(
            config.deepseek_api_key.as_deref(),
            &config.deepseek_api_url,
            &config.deepseek_model,
            config.http_timeout,
        )
    }

    /// Check if API key is configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl AiClient for DeepSeekClient {
    async fn complete(&self, mode: Mode, input: &str, profile: &Profile) -> Result<String, AiError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AiError::NotConfigured("DEEPSEEK_API_KEY not set"))?;

        let ins = instruction(mode, input, profile);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &ins.system,
                },
                Message {
                    role: "user",
                    content: &ins.user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!("Calling DeepSeek: mode={}, input_len={}", mode, input.len());

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let result: ChatResponse = response.json().await?;
        if let Some(usage) = &result.usage {
            info!(
                "DeepSeek response: mode={}, in={}, out={}",
                mode, usage.prompt_tokens, usage.completion_tokens
            );
        }

        result.first_content().ok_or(AiError::EmptyResponse)
    }
}
