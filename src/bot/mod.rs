//! Conversation Core
//!
//! Per-user state machine driving onboarding, the registered-user
//! dispatcher, the two-stage analysis reveal and the post-incident
//! sub-dialogue.
//!
//! ```text
//! inbound ─► dedup ─► per-user lock ─► load/create record
//!                                         │
//!            reset pre-check / thumbs ◄───┤
//!                                         ▼
//!            ┌──────────── branch on persisted state ─────────────┐
//!            │ onboarding │ registered │ detail choice │ incident │
//!            └────────────────────────────────────────────────────┘
//!                          │ AI bridge calls, sends, one update per step
//!                          ▼
//!                     release lock
//! ```
//!
//! Every state change is written before the reply that announces it, so a
//! failed write never leaves the user told about a transition that did not
//! happen.

mod analysis;
mod dispatcher;
mod images;
mod incident;
mod onboarding;

pub use analysis::ImageContext;
pub use images::ImageError;

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai::{AiClient, ClassifierBridge};
use crate::channels::{InboundMessage, MediaFetcher, MessageSender};
use crate::dedup::MessageDedup;
use crate::media::{ImageArchive, OcrEngine};
use crate::replies;
use crate::store::{UserRecord, UserState, UserStore, UserUpdate};
use crate::text::{is_reset_command, normalize, Feedback};
use crate::user_locks::UserLocks;

/// Collaborators the bot is built from
pub struct BotDeps {
    pub store: Arc<UserStore>,
    pub ai: Arc<dyn AiClient>,
    pub sender: Arc<dyn MessageSender>,
    pub media: Arc<dyn MediaFetcher>,
    pub ocr: Arc<dyn OcrEngine>,
    pub archive: Arc<ImageArchive>,
    pub dedup: Arc<MessageDedup>,
    pub locks: Arc<UserLocks>,
}

/// What happened to one inbound delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Message id already processed; nothing done
    Duplicate,
    /// First contact: record created and welcome sent
    NewUser,
    Handled,
}

/// Shared handle; clones are cheap and share every collaborator
#[derive(Clone)]
pub struct SecurityBot {
    store: Arc<UserStore>,
    classifier: ClassifierBridge,
    sender: Arc<dyn MessageSender>,
    media: Arc<dyn MediaFetcher>,
    ocr: Arc<dyn OcrEngine>,
    archive: Arc<ImageArchive>,
    dedup: Arc<MessageDedup>,
    locks: Arc<UserLocks>,
}

impl SecurityBot {
    pub fn new(deps: BotDeps) -> Self {
        Self {
            store: deps.store,
            classifier: ClassifierBridge::new(deps.ai),
            sender: deps.sender,
            media: deps.media,
            ocr: deps.ocr,
            archive: deps.archive,
            dedup: deps.dedup,
            locks: deps.locks,
        }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn locks(&self) -> &UserLocks {
        &self.locks
    }

    /// Process one inbound delivery end to end.
    ///
    /// Errors are persistence failures only; collaborator failures have
    /// already been turned into apologies.
    pub async fn handle_inbound(&self, msg: InboundMessage) -> Result<Disposition> {
        if !self.dedup.check_and_remember(&msg.id) {
            return Ok(Disposition::Duplicate);
        }

        let _guard = self.locks.acquire(&msg.from).await;

        let (user, created) = self.store.get_or_create(&msg.from)?;
        if created {
            info!(phone = %msg.from, "New user, sending terms");
            self.reply(&msg.from, &replies::welcome_terms()).await;
            return Ok(Disposition::NewUser);
        }

        debug!(
            phone = %msg.from,
            message_id = %msg.id,
            state = user.state_code,
            kind = %msg.kind,
            "Handling message"
        );
        self.route(&user, &msg).await?;
        Ok(Disposition::Handled)
    }

    async fn route(&self, user: &UserRecord, msg: &InboundMessage) -> Result<()> {
        if let Some(text) = msg.kind.text() {
            if is_reset_command(&normalize(text)) {
                return self.handle_reset(user).await;
            }

            if let Some(feedback) = Feedback::parse(text) {
                if user.state() == Some(UserState::Registered) {
                    info!(phone = %user.phone, feedback = feedback.as_str(), "Feedback received");
                    self.store.record_feedback(&user.phone, feedback.as_str())?;
                    self.reply(&user.phone, &replies::feedback_thanks()).await;
                    return Ok(());
                }
            }
        }

        match user.state() {
            Some(state) if state.is_onboarding() => {
                self.handle_onboarding(user, state, &msg.kind).await
            }
            Some(UserState::Registered) => self.handle_registered(user, &msg.kind).await,
            Some(UserState::AwaitingDetailChoice) => {
                self.handle_detail_choice(user, &msg.kind).await
            }
            Some(UserState::AwaitingIncidentReply) => self.handle_incident(user, &msg.kind).await,
            Some(_) | None => {
                warn!(phone = %user.phone, state = user.state_code, "Unknown persisted state, forcing registered");
                self.store
                    .update(&user.phone, &UserUpdate::new().state(UserState::Registered))?;
                self.reply(&user.phone, &replies::memory_glitch(user.display_name()))
                    .await;
                Ok(())
            }
        }
    }

    /// Reset phrase outside the AI path; lands on `Registered` from any state
    async fn handle_reset(&self, user: &UserRecord) -> Result<()> {
        let name = user.display_name();
        if !user.profile_complete() {
            warn!(phone = %user.phone, state = user.state_code, "Reset before onboarding finished");
        }

        self.store.update(
            &user.phone,
            &UserUpdate::new()
                .state(UserState::Registered)
                .clear_transients(),
        )?;
        info!(phone = %user.phone, "Conversation reset");
        self.reply(&user.phone, &replies::reset_done(name)).await;
        Ok(())
    }

    /// Best-effort send; failures are logged, never propagated
    async fn reply(&self, to: &str, text: &str) {
        if let Err(e) = self.sender.send_text(to, text).await {
            warn!(phone = %to, "Failed to send reply: {}", e);
        }
    }
}
