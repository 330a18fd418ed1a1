//! AI Collaborator
//!
//! The language model is treated as an opaque `complete(mode, input, profile)`
//! function. Each [`Mode`] has a fixed instruction profile ([`prompts`]) and a
//! closed output taxonomy ([`taxonomy`]); [`ClassifierBridge`] ties the two
//! together and turns every failure into an "unclear" outcome.

pub mod bridge;
pub mod deepseek;
pub mod prompts;
pub mod taxonomy;

pub use bridge::ClassifierBridge;
pub use deepseek::DeepSeekClient;

use async_trait::async_trait;
use std::fmt;

use crate::store::KnowledgeLevel;

/// Named AI call, each with its own instructions and expected output shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    ExtractName,
    ExtractAge,
    ClassifyKnowledge,
    ClassifyIntent,
    AnalyzeForScam,
    DecideWantsDetails,
    DecidePostIncidentReply,
    GenerateHelpSteps,
    AnswerSecurityQuestion,
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::ExtractName,
        Mode::ExtractAge,
        Mode::ClassifyKnowledge,
        Mode::ClassifyIntent,
        Mode::AnalyzeForScam,
        Mode::DecideWantsDetails,
        Mode::DecidePostIncidentReply,
        Mode::GenerateHelpSteps,
        Mode::AnswerSecurityQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::ExtractName => "extract-name",
            Mode::ExtractAge => "extract-age",
            Mode::ClassifyKnowledge => "classify-knowledge",
            Mode::ClassifyIntent => "classify-intent",
            Mode::AnalyzeForScam => "analyze-for-scam",
            Mode::DecideWantsDetails => "decide-wants-details",
            Mode::DecidePostIncidentReply => "decide-post-incident-reply",
            Mode::GenerateHelpSteps => "generate-help-steps",
            Mode::AnswerSecurityQuestion => "answer-security-question",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User fields rendered into the instructions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub knowledge: Option<KnowledgeLevel>,
    pub last_analyzed_url: Option<String>,
}

/// Error types for AI calls
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service not configured: {0}")]
    NotConfigured(&'static str),

    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI response had no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}

/// Language-model backend
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Run one mode over the input text; the reply is trimmed free text
    async fn complete(&self, mode: Mode, input: &str, profile: &Profile) -> Result<String, AiError>;
}
