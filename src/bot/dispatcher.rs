//! Registered-User Dispatcher

use anyhow::Result;
use tracing::{debug, info};

use super::SecurityBot;
use crate::ai::taxonomy::Intent;
use crate::channels::InboundKind;
use crate::replies::{self, RecentActivity};
use crate::store::{UserRecord, UserState, UserUpdate};
use crate::text::{collapse_whitespace, meta_topic, normalize, MetaTopic};

impl SecurityBot {
    pub(super) async fn handle_registered(&self, user: &UserRecord, kind: &InboundKind) -> Result<()> {
        let name = user.display_name();
        match kind {
            InboundKind::Text(body) => self.dispatch_text(user, body).await,
            InboundKind::Image {
                media_id: Some(media_id),
            } => {
                self.reply(&user.phone, &replies::image_received(name)).await;
                self.spawn_image_task(&user.phone, media_id);
                Ok(())
            }
            InboundKind::Image { media_id: None } => {
                self.reply(&user.phone, &replies::image_missing_reference(name))
                    .await;
                Ok(())
            }
            InboundKind::Audio => {
                self.reply(&user.phone, &replies::audio_not_supported(name))
                    .await;
                Ok(())
            }
            InboundKind::Other(kind) => {
                self.reply(&user.phone, &replies::unsupported_type(name, kind))
                    .await;
                Ok(())
            }
        }
    }

    /// Classify a text from a registered user and act on the intent
    pub(super) async fn dispatch_text(&self, user: &UserRecord, body: &str) -> Result<()> {
        let name = user.display_name();
        let cleaned = collapse_whitespace(body);
        if cleaned.is_empty() {
            self.reply(&user.phone, &replies::registered_empty(name)).await;
            return Ok(());
        }

        let profile = user.profile();
        let intent = self.classifier.classify_intent(&cleaned, &profile).await;
        debug!(phone = %user.phone, ?intent, "Intent classified");

        match intent {
            Some(Intent::ResetCommand) => {
                self.store.update(
                    &user.phone,
                    &UserUpdate::new()
                        .state(UserState::Registered)
                        .clear_transients(),
                )?;
                info!(phone = %user.phone, "Conversation reset by intent");
                self.reply(&user.phone, &replies::reset_to_menu(name)).await;
            }
            Some(Intent::Greeting) => {
                let recent = if user.image.is_some() {
                    RecentActivity::ImageAnalysis
                } else if user.last_analyzed_url.is_some() {
                    RecentActivity::LinkAnalysis
                } else {
                    RecentActivity::Nothing
                };
                self.reply(&user.phone, &replies::greeting(name, recent)).await;
            }
            Some(Intent::Analyze) => {
                self.run_analysis(user, &cleaned, None).await?;
            }
            Some(Intent::SecurityQuestion) => {
                self.reply(&user.phone, &replies::security_question_ack(name))
                    .await;
                match self.classifier.answer_question(&cleaned, &profile).await {
                    Some(answer) => self.reply(&user.phone, &answer).await,
                    None => {
                        self.reply(&user.phone, &replies::security_question_failed(name))
                            .await
                    }
                }
                self.reply(&user.phone, &replies::security_question_closing(name))
                    .await;
            }
            Some(Intent::MetaQuestion) => {
                let reply = match meta_topic(&normalize(&cleaned)) {
                    MetaTopic::Images => replies::meta_images(name),
                    MetaTopic::Capabilities => replies::meta_capabilities(name),
                    MetaTopic::Audio => replies::meta_audio(name),
                    MetaTopic::General => replies::meta_general(name),
                };
                self.reply(&user.phone, &reply).await;
            }
            Some(Intent::RequestTip) => {
                self.reply(&user.phone, &replies::tip(name, replies::random_tip()))
                    .await;
            }
            Some(Intent::Irrelevant) | None => {
                self.reply(&user.phone, &replies::capabilities_menu(name))
                    .await;
            }
        }
        Ok(())
    }
}
