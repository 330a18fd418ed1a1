//! Onboarding State Machine
//!
//! AwaitingTerms → AwaitingName → AwaitingAge → AwaitingKnowledge → Registered.
//! Each step advances only on a recognised answer; anything else re-asks.

use anyhow::Result;
use tracing::info;

use super::SecurityBot;
use crate::ai::taxonomy::{AgeOutcome, NameOutcome};
use crate::channels::InboundKind;
use crate::replies;
use crate::store::{UserRecord, UserState, UserUpdate};
use crate::text::{is_terms_acceptance, is_terms_rejection, normalize};

/// Plausible age range, inclusive
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 5..=120;

impl SecurityBot {
    pub(super) async fn handle_onboarding(
        &self,
        user: &UserRecord,
        state: UserState,
        kind: &InboundKind,
    ) -> Result<()> {
        let name = user.display_name();
        let Some(text) = kind.text() else {
            self.reply(&user.phone, &replies::onboarding_needs_text(name))
                .await;
            return Ok(());
        };

        let text = text.trim();
        if text.is_empty() {
            self.reply(&user.phone, &replies::onboarding_empty(name)).await;
            return Ok(());
        }

        match state {
            UserState::AwaitingTerms => self.handle_terms(user, text).await,
            UserState::AwaitingName => self.handle_name(user, text).await,
            UserState::AwaitingAge => self.handle_age(user, text).await,
            UserState::AwaitingKnowledge => self.handle_knowledge(user, text).await,
            _ => Ok(()),
        }
    }

    async fn handle_terms(&self, user: &UserRecord, text: &str) -> Result<()> {
        let normalized = normalize(text);

        if is_terms_acceptance(&normalized) {
            self.store.update(
                &user.phone,
                &UserUpdate::new()
                    .accepted_terms(true)
                    .state(UserState::AwaitingName),
            )?;
            info!(phone = %user.phone, "Terms accepted");
            self.reply(&user.phone, &replies::terms_accepted()).await;
        } else if is_terms_rejection(&normalized) {
            info!(phone = %user.phone, "Terms rejected");
            self.reply(&user.phone, &replies::terms_rejected()).await;
        } else {
            self.reply(&user.phone, &replies::terms_reprompt()).await;
        }
        Ok(())
    }

    async fn handle_name(&self, user: &UserRecord, text: &str) -> Result<()> {
        match self.classifier.extract_name(text).await {
            NameOutcome::Valid(name) => {
                self.store.update(
                    &user.phone,
                    &UserUpdate::new().name(&name).state(UserState::AwaitingAge),
                )?;
                info!(phone = %user.phone, "Name stored");
                self.reply(&user.phone, &replies::ask_age(&name)).await;
            }
            NameOutcome::Invalid => {
                self.reply(&user.phone, &replies::name_invalid()).await;
            }
            NameOutcome::Unclear => {
                self.reply(&user.phone, &replies::name_unclear()).await;
            }
        }
        Ok(())
    }

    async fn handle_age(&self, user: &UserRecord, text: &str) -> Result<()> {
        let name = user.display_name();
        match self.classifier.extract_age(text).await {
            AgeOutcome::Valid(age) if AGE_RANGE.contains(&age) => {
                self.store.update(
                    &user.phone,
                    &UserUpdate::new().age(age).state(UserState::AwaitingKnowledge),
                )?;
                info!(phone = %user.phone, age, "Age stored");
                self.reply(&user.phone, &replies::ask_knowledge(name)).await;
            }
            AgeOutcome::Valid(age) => {
                self.reply(&user.phone, &replies::age_out_of_range(name, age))
                    .await;
            }
            AgeOutcome::Invalid => {
                self.reply(&user.phone, &replies::age_invalid(name)).await;
            }
            AgeOutcome::Unclear => {
                self.reply(&user.phone, &replies::age_unclear(name)).await;
            }
        }
        Ok(())
    }

    async fn handle_knowledge(&self, user: &UserRecord, text: &str) -> Result<()> {
        let name = user.display_name();
        match self.classifier.classify_knowledge(text).await {
            Some(level) => {
                self.store.update(
                    &user.phone,
                    &UserUpdate::new()
                        .knowledge(level)
                        .state(UserState::Registered),
                )?;
                info!(phone = %user.phone, knowledge = level.as_str(), "Registration complete");
                self.reply(&user.phone, &replies::registration_complete(name))
                    .await;
            }
            None => {
                self.reply(&user.phone, &replies::knowledge_unclear(name))
                    .await;
            }
        }
        Ok(())
    }
}
