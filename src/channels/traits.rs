//! Channel Trait Definitions
//!
//! Interfaces the bot needs from a messaging channel: outbound text and
//! inbound media lookup. Kept separate so tests can swap in doubles.

use async_trait::async_trait;
use std::fmt;

/// Error types for channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u64),

    #[error("Media download failed: {0}")]
    MediaDownloadFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payload of one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Text body, untrimmed
    Text(String),
    /// Image with its media reference, when the payload carried one
    Image { media_id: Option<String> },
    Audio,
    /// Any other WhatsApp type, by name
    Other(String),
}

impl InboundKind {
    /// Text body, or `None` for non-text messages
    pub fn text(&self) -> Option<&str> {
        match self {
            InboundKind::Text(body) => Some(body),
            _ => None,
        }
    }
}

impl fmt::Display for InboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundKind::Text(_) => write!(f, "text"),
            InboundKind::Image { .. } => write!(f, "image"),
            InboundKind::Audio => write!(f, "audio"),
            InboundKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// One inbound message from the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Externally assigned message id (dedup key)
    pub id: String,
    /// Sender phone number
    pub from: String,
    pub kind: InboundKind,
}

impl InboundMessage {
    pub fn text(id: &str, from: &str, body: &str) -> Self {
        Self {
            id: id.to_string(),
            from: from.to_string(),
            kind: InboundKind::Text(body.to_string()),
        }
    }

    pub fn image(id: &str, from: &str, media_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            from: from.to_string(),
            kind: InboundKind::Image {
                media_id: media_id.map(|s| s.to_string()),
            },
        }
    }
}

/// Outbound text delivery
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message; returns the id of the last part sent
    async fn send_text(&self, to: &str, text: &str) -> Result<String, ChannelError>;
}

/// Inbound media lookup
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the bytes behind a media reference
    async fn fetch_image(&self, media_id: &str) -> Result<Vec<u8>, ChannelError>;
}
