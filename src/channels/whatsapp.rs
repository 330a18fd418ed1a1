//! WhatsApp Channel Implementation
//!
//! Uses the WhatsApp Cloud API (Meta Graph API) for sends and media
//! downloads, and parses the Cloud API webhook payload.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ACCESS_TOKEN`: Cloud API bearer token
//! - `PHONE_NUMBER_ID`: sender phone number id
//! - `GRAPH_API_VERSION`: API version path segment (default `v18.0`)
//!
//! # Webhook Setup
//!
//! Subscribe the app's `messages` field and point the callback URL at
//! `https://your-domain.com/webhook` with the same `VERIFY_TOKEN`.

use super::traits::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// WhatsApp channel configuration
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Cloud API bearer token
    pub access_token: Option<String>,
    /// Sender phone number id
    pub phone_number_id: Option<String>,
    /// Graph API version, e.g. `v18.0`
    pub api_version: String,
    /// Graph API host (overridable for tests)
    pub api_base: String,
    /// Maximum message length (WhatsApp limit: 4096)
    pub max_message_length: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl WhatsAppConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            api_version: config.graph_api_version.clone(),
            api_base: GRAPH_API_BASE.to_string(),
            max_message_length: 4096,
            timeout: config.http_timeout,
        }
    }
}

/// WhatsApp channel implementation
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChannelError::Internal(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Create from the process config
    pub fn from_config(config: &Config) -> Result<Self, ChannelError> {
        Self::new(WhatsAppConfig::from_config(config))
    }

    fn access_token(&self) -> Result<&str, ChannelError> {
        self.config
            .access_token
            .as_deref()
            .ok_or(ChannelError::NotConfigured("ACCESS_TOKEN not set"))
    }

    fn messages_url(&self) -> Result<String, ChannelError> {
        let phone_number_id = self
            .config
            .phone_number_id
            .as_deref()
            .ok_or(ChannelError::NotConfigured("PHONE_NUMBER_ID not set"))?;
        Ok(format!(
            "{}/{}/{}/messages",
            self.config.api_base, self.config.api_version, phone_number_id
        ))
    }

    /// Send one chunk via the Cloud API
    async fn send_graph_message(&self, to: &str, body: &str) -> Result<String, ChannelError> {
        let url = self.messages_url()?;
        let token = self.access_token()?;

        let request = SendRequest {
            messaging_product: "whatsapp",
            to,
            r#type: "text",
            text: SendText { body },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        if response.status().is_success() {
            let result: SendResponse = response
                .json()
                .await
                .map_err(|e| ChannelError::Internal(e.to_string()))?;
            Ok(result
                .messages
                .into_iter()
                .next()
                .map(|m| m.id)
                .unwrap_or_default())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                Err(ChannelError::RateLimited(60))
            } else {
                Err(ChannelError::SendFailed(format!(
                    "Graph API error {}: {}",
                    status, error_text
                )))
            }
        }
    }
}

/// Split long messages into chunks of at most `max_len` characters.
///
/// Breaks on line boundaries where possible; a single overlong line is cut
/// on character boundaries.
pub fn split_message(content: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if content.chars().count() <= max_len {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if line_len > max_len {
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(max_len) {
                    chunks.push(piece.iter().collect());
                }
            } else {
                current.push_str(line);
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl MessageSender for WhatsAppChannel {
    async fn send_text(&self, to: &str, text: &str) -> Result<String, ChannelError> {
        let chunks = split_message(text, self.config.max_message_length);
        let mut last_id = String::new();

        for (i, chunk) in chunks.iter().enumerate() {
            last_id = self.send_graph_message(to, chunk).await?;

            // Small delay between chunks to maintain order
            if i < chunks.len() - 1 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        debug!("Sent {} part(s) to {}", chunks.len(), to);
        Ok(last_id)
    }
}

#[async_trait]
impl MediaFetcher for WhatsAppChannel {
    async fn fetch_image(&self, media_id: &str) -> Result<Vec<u8>, ChannelError> {
        let token = self.access_token()?;

        // Media id resolves to a short-lived download URL first
        let info_url = format!(
            "{}/{}/{}",
            self.config.api_base, self.config.api_version, media_id
        );
        let info_response = self
            .client
            .get(&info_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChannelError::MediaDownloadFailed(e.to_string()))?;

        if !info_response.status().is_success() {
            return Err(ChannelError::MediaDownloadFailed(format!(
                "media lookup {} returned {}",
                media_id,
                info_response.status()
            )));
        }

        let info: MediaInfo = info_response
            .json()
            .await
            .map_err(|e| ChannelError::MediaDownloadFailed(e.to_string()))?;

        let bytes_response = self
            .client
            .get(&info.url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChannelError::MediaDownloadFailed(e.to_string()))?;

        if !bytes_response.status().is_success() {
            return Err(ChannelError::MediaDownloadFailed(format!(
                "media download {} returned {}",
                media_id,
                bytes_response.status()
            )));
        }

        let bytes = bytes_response
            .bytes()
            .await
            .map_err(|e| ChannelError::MediaDownloadFailed(e.to_string()))?;

        info!("Downloaded media {} ({} bytes)", media_id, bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Cloud API send request
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    r#type: &'static str,
    text: SendText<'a>,
}

#[derive(Debug, Serialize)]
struct SendText<'a> {
    body: &'a str,
}

/// Cloud API send response
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Media lookup response
#[derive(Debug, Deserialize)]
struct MediaInfo {
    url: String,
}

/// Cloud API webhook payload
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    pub from: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<WebhookText>,
    pub image: Option<WebhookMedia>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookText {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMedia {
    pub id: Option<String>,
}

impl WebhookPayload {
    /// First message of the first change.
    ///
    /// `None` for status callbacks and for messages missing the sender or id.
    pub fn first_message(self) -> Option<InboundMessage> {
        let message = self
            .entry
            .into_iter()
            .next()?
            .changes
            .into_iter()
            .next()?
            .value
            .messages
            .into_iter()
            .next()?;

        let from = message.from.filter(|s| !s.is_empty());
        let id = message.id.filter(|s| !s.is_empty());
        let (Some(from), Some(id)) = (from, id) else {
            warn!("Webhook message without sender or id ignored");
            return None;
        };

        let kind = match message.kind.as_deref() {
            Some("text") => InboundKind::Text(message.text.map(|t| t.body).unwrap_or_default()),
            Some("image") => InboundKind::Image {
                media_id: message.image.and_then(|m| m.id).filter(|s| !s.is_empty()),
            },
            Some("audio") => InboundKind::Audio,
            Some(other) => InboundKind::Other(other.to_string()),
            None => InboundKind::Other("unknown".to_string()),
        };

        Some(InboundMessage { id, from, kind })
    }
}
