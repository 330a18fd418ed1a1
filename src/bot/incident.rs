//! Post-Incident Sub-dialogue
//!
//! Entered after a revealed report asked "did you click?". Only a yes, a
//! no or a help request ends it; questions and comments are answered and
//! the yes/no/help prompt is repeated.

use anyhow::Result;
use tracing::info;

use super::SecurityBot;
use crate::ai::taxonomy::IncidentReply;
use crate::channels::InboundKind;
use crate::replies;
use crate::store::{UserRecord, UserState, UserUpdate};
use crate::text::{comment_kind, excerpt, normalize, CommentKind};

/// Characters of the user's question quoted back in the acknowledgement
const QUESTION_EXCERPT_CHARS: usize = 30;

const HELP_AFTER_YES: &str = "El usuario indicó que SÍ interactuó con la estafa.";
const HELP_ON_REQUEST: &str = "El usuario escribió AYUDA tras un análisis de estafa.";

impl SecurityBot {
    pub(super) async fn handle_incident(&self, user: &UserRecord, kind: &InboundKind) -> Result<()> {
        let name = user.display_name();
        let Some(body) = kind.text() else {
            self.reply(&user.phone, &replies::incident_needs_text(name))
                .await;
            return Ok(());
        };

        let body = body.trim();
        if body.is_empty() {
            self.reply(&user.phone, &replies::incident_empty(name)).await;
            return Ok(());
        }

        let normalized = normalize(body);
        let profile = user.profile();

        match self
            .classifier
            .decide_incident_reply(&normalized, &profile)
            .await
        {
            reply @ (IncidentReply::Yes | IncidentReply::AsksHelp) => {
                let (ack, request) = if reply == IncidentReply::Yes {
                    (replies::incident_yes_ack(name), HELP_AFTER_YES)
                } else {
                    (replies::incident_help_ack(name), HELP_ON_REQUEST)
                };
                self.reply(&user.phone, &ack).await;

                let steps = self.classifier.help_steps(request, &profile).await;
                self.conclude(user)?;

                match steps {
                    Some(steps) => self.reply(&user.phone, &steps).await,
                    None => {
                        self.reply(&user.phone, &replies::help_steps_failed(name))
                            .await
                    }
                }
            }
            IncidentReply::No => {
                self.conclude(user)?;
                self.reply(&user.phone, &replies::incident_no(name)).await;
            }
            IncidentReply::Question => {
                let quoted = excerpt(body, QUESTION_EXCERPT_CHARS);
                self.reply(&user.phone, &replies::incident_question_ack(name, &quoted))
                    .await;

                match self.classifier.answer_question(body, &profile).await {
                    Some(answer) => {
                        self.reply(&user.phone, &answer).await;
                        self.reply(&user.phone, &replies::incident_reprompt_after_digression(name))
                            .await;
                    }
                    None => {
                        self.reply(&user.phone, &replies::incident_question_failed(name))
                            .await;
                    }
                }
            }
            IncidentReply::Comment => {
                let reply = match comment_kind(&normalized) {
                    CommentKind::Thanks => replies::incident_comment_thanks(name),
                    CommentKind::Acknowledged => replies::incident_comment_ack(name),
                    CommentKind::Other => replies::incident_comment_other(name),
                };
                self.reply(&user.phone, &reply).await;
            }
            IncidentReply::Unclear => {
                self.reply(&user.phone, &replies::incident_reprompt(name))
                    .await;
            }
        }
        Ok(())
    }

    /// Leave the sub-dialogue and forget the analysed URL
    fn conclude(&self, user: &UserRecord) -> Result<()> {
        self.store.update(
            &user.phone,
            &UserUpdate::new()
                .state(UserState::Registered)
                .clear_last_analyzed_url(),
        )?;
        info!(phone = %user.phone, "Incident dialogue concluded");
        Ok(())
    }
}
