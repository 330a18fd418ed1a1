//! Intent/Field Classifier Bridge
//!
//! Typed wrappers over [`AiClient`]. A failed call, a blank reply and a
//! reply outside the mode's taxonomy all surface as the same unclear
//! outcome, so handlers only ever branch on taxonomy values.

use std::sync::Arc;
use tracing::{debug, warn};

use super::taxonomy::{
    parse_knowledge, AgeOutcome, DetailChoice, IncidentReply, Intent, NameOutcome, ScamReport,
};
use super::{AiClient, Mode, Profile};
use crate::store::KnowledgeLevel;

#[derive(Clone)]
pub struct ClassifierBridge {
    client: Arc<dyn AiClient>,
}

impl ClassifierBridge {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self { client }
    }

    async fn ask(&self, mode: Mode, input: &str, profile: &Profile) -> Option<String> {
        match self.client.complete(mode, input, profile).await {
            Ok(reply) => {
                let reply = reply.trim();
                if reply.is_empty() {
                    warn!("Blank AI reply for mode {}", mode);
                    return None;
                }
                debug!("AI {} -> {:.80}", mode, reply);
                Some(reply.to_string())
            }
            Err(e) => {
                warn!("AI call failed for mode {}: {}", mode, e);
                None
            }
        }
    }

    pub async fn extract_name(&self, input: &str) -> NameOutcome {
        self.ask(Mode::ExtractName, input, &Profile::default())
            .await
            .map_or(NameOutcome::Unclear, |r| NameOutcome::parse(&r))
    }

    pub async fn extract_age(&self, input: &str) -> AgeOutcome {
        self.ask(Mode::ExtractAge, input, &Profile::default())
            .await
            .map_or(AgeOutcome::Unclear, |r| AgeOutcome::parse(&r))
    }

    pub async fn classify_knowledge(&self, input: &str) -> Option<KnowledgeLevel> {
        self.ask(Mode::ClassifyKnowledge, input, &Profile::default())
            .await
            .and_then(|r| parse_knowledge(&r))
    }

    pub async fn classify_intent(&self, input: &str, profile: &Profile) -> Option<Intent> {
        let reply = self.ask(Mode::ClassifyIntent, input, profile).await?;
        let intent = Intent::parse(&reply);
        if intent.is_none() {
            warn!("Intent outside taxonomy: {:?}", reply);
        }
        intent
    }

    /// `None` on failure or when the reply has no summary part
    pub async fn analyze(&self, input: &str, profile: &Profile) -> Option<ScamReport> {
        let reply = self.ask(Mode::AnalyzeForScam, input, profile).await?;
        ScamReport::parse(&reply)
    }

    pub async fn decide_wants_details(&self, input: &str) -> DetailChoice {
        self.ask(Mode::DecideWantsDetails, input, &Profile::default())
            .await
            .map_or(DetailChoice::Unclear, |r| DetailChoice::parse(&r))
    }

    pub async fn decide_incident_reply(&self, input: &str, profile: &Profile) -> IncidentReply {
        self.ask(Mode::DecidePostIncidentReply, input, profile)
            .await
            .map_or(IncidentReply::Unclear, |r| IncidentReply::parse(&r))
    }

    pub async fn help_steps(&self, input: &str, profile: &Profile) -> Option<String> {
        self.ask(Mode::GenerateHelpSteps, input, profile).await
    }

    pub async fn answer_question(&self, input: &str, profile: &Profile) -> Option<String> {
        self.ask(Mode::AnswerSecurityQuestion, input, profile).await
    }
}
