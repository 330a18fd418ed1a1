//! Messaging Channel
//!
//! WhatsApp Cloud API transport behind two small traits:
//! - `MessageSender`: outbound text
//! - `MediaFetcher`: inbound image bytes
//!
//! The bot only depends on the traits; tests plug in recording doubles.

pub mod traits;
pub mod whatsapp;

pub use traits::{ChannelError, InboundKind, InboundMessage, MediaFetcher, MessageSender};
pub use whatsapp::{split_message, WebhookPayload, WhatsAppChannel, WhatsAppConfig};
