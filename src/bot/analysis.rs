//! Scam-Analysis Two-Stage Reveal Flow
//!
//! The summary goes out right away; the full report is parked on the
//! record until the user confirms they want it. A report that ends by
//! asking whether the user clicked arms the incident sub-dialogue.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::SecurityBot;
use crate::ai::taxonomy::DetailChoice;
use crate::channels::InboundKind;
use crate::replies;
use crate::store::{ImageProvenance, UserRecord, UserState, UserUpdate};
use crate::text::{asks_incident_question, extract_first_url, normalize};

/// Where the analysed text came from when it was read off an image
#[derive(Debug, Clone)]
pub struct ImageContext {
    /// Raw OCR output, before the provenance note was added
    pub ocr_text: String,
    /// Archived file name
    pub image_ref: String,
}

impl SecurityBot {
    /// Analyse a message and park the full report behind the details gate
    pub(super) async fn run_analysis(
        &self,
        user: &UserRecord,
        text: &str,
        image: Option<&ImageContext>,
    ) -> Result<()> {
        let name = user.display_name();

        // The AI call takes seconds; acknowledge first
        self.reply(&user.phone, &replies::analysis_ack(name)).await;

        let url = extract_first_url(text)
            .or_else(|| image.and_then(|ctx| extract_first_url(&ctx.ocr_text)));

        let Some(report) = self.classifier.analyze(text, &user.profile()).await else {
            warn!(phone = %user.phone, "Analysis failed, state unchanged");
            self.reply(&user.phone, &replies::analysis_failed(name)).await;
            return Ok(());
        };

        let mut update = UserUpdate::new()
            .state(UserState::AwaitingDetailChoice)
            .pending_detail(report.detail.as_str())
            .last_analyzed_url(url);

        if let Some(ctx) = image {
            update = update.image(ImageProvenance {
                ocr_text: ctx.ocr_text.clone(),
                raw_analysis: report.raw.clone(),
                image_ref: ctx.image_ref.clone(),
                timestamp: chrono::Local::now().to_rfc3339(),
            });
        }

        if let Err(e) = self.store.update(&user.phone, &update) {
            self.reply(&user.phone, &replies::analysis_failed(name)).await;
            return Err(e).context("persisting analysis result");
        }
        info!(
            phone = %user.phone,
            from_image = image.is_some(),
            detail_len = report.detail.len(),
            "Analysis summary ready"
        );

        self.reply(&user.phone, &report.summary).await;
        self.reply(&user.phone, &replies::ask_for_details(name)).await;
        Ok(())
    }

    /// Next message after the summary: reveal, re-dispatch or re-ask
    pub(super) async fn handle_detail_choice(
        &self,
        user: &UserRecord,
        kind: &InboundKind,
    ) -> Result<()> {
        let name = user.display_name();
        let Some(body) = kind.text() else {
            self.reply(&user.phone, &replies::details_needs_text(name)).await;
            return Ok(());
        };

        let normalized = normalize(body);
        if normalized.is_empty() {
            self.reply(&user.phone, &replies::details_choice_unclear(name))
                .await;
            return Ok(());
        }

        match self.classifier.decide_wants_details(&normalized).await {
            DetailChoice::WantsDetails => {
                let detail = user
                    .pending_detail
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty());

                let Some(detail) = detail else {
                    self.store.update(
                        &user.phone,
                        &UserUpdate::new()
                            .state(UserState::Registered)
                            .clear_pending_detail(),
                    )?;
                    self.reply(&user.phone, &replies::details_missing()).await;
                    return Ok(());
                };

                let next = if asks_incident_question(detail) {
                    UserState::AwaitingIncidentReply
                } else {
                    UserState::Registered
                };
                self.store.update(
                    &user.phone,
                    &UserUpdate::new().state(next).clear_pending_detail(),
                )?;
                info!(phone = %user.phone, next = next.as_str(), "Full report revealed");

                self.reply(&user.phone, detail).await;
                self.reply(&user.phone, &replies::ask_feedback(name)).await;
            }
            DetailChoice::SomethingElse => {
                self.store.update(
                    &user.phone,
                    &UserUpdate::new()
                        .state(UserState::Registered)
                        .clear_pending_detail(),
                )?;
                info!(phone = %user.phone, "Details declined, treating as a new request");

                let reloaded = self
                    .store
                    .get(&user.phone)?
                    .with_context(|| format!("user {} missing after update", user.phone))?;
                self.dispatch_text(&reloaded, body).await?;
            }
            DetailChoice::Unclear => {
                self.reply(&user.phone, &replies::details_choice_unclear(name))
                    .await;
            }
        }
        Ok(())
    }
}
