//! SecurityBot-WA
//!
//! WhatsApp security-awareness assistant: registers users, analyses
//! suspicious messages and screenshots for scams, answers security
//! questions and walks users through what to do after falling for one.
//!
//! # Features
//!
//! - **Webhook Server**: WhatsApp Cloud API verification + delivery (axum)
//! - **Onboarding**: terms, name, age and knowledge level, AI-validated
//! - **Scam Analysis**: summary first, full report on request
//! - **Image Pipeline**: download, archive, Tesseract OCR, analysis
//! - **Incident Follow-up**: recovery steps after a confirmed click
//! - **Persistence**: SQLite user records, image log and feedback
//!
//! # Architecture
//!
//! ```text
//! WhatsApp ──► /webhook ──► SecurityBot ──► DeepSeek API
//!               (axum)           │
//!                                ├── Dedup (recent message ids)
//!                                ├── UserLocks (one turn per phone)
//!                                ├── UserStore (SQLite)
//!                                ├── ClassifierBridge (AI modes)
//!                                ├── Media (download + OCR + archive)
//!                                └── WhatsAppChannel (Graph API sends)
//! ```

pub mod ai;
pub mod bot;
pub mod channels;
pub mod config;
pub mod dedup;
pub mod media;
pub mod replies;
pub mod server;
pub mod store;
pub mod text;
pub mod user_locks;

pub use ai::{AiClient, AiError, ClassifierBridge, DeepSeekClient, Mode, Profile};
pub use bot::{BotDeps, Disposition, SecurityBot};
pub use channels::{InboundKind, InboundMessage, MediaFetcher, MessageSender, WhatsAppChannel};
pub use config::Config;
pub use dedup::MessageDedup;
pub use media::{ImageArchive, OcrEngine, OcrError, TesseractOcr};
pub use server::AppState;
pub use store::{UserRecord, UserState, UserStore, UserUpdate};
pub use user_locks::UserLocks;
