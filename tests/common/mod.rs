//! Shared test doubles for the bot integration tests.
//!
//! Every collaborator the bot talks to is replaced by a scripted or
//! recording double; the store is a real SQLite database.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use securitybot_wa::channels::ChannelError;
use securitybot_wa::store::{KnowledgeLevel, UserRecord, UserState, UserUpdate};
use securitybot_wa::{
    AiClient, AiError, BotDeps, Disposition, ImageArchive, InboundMessage, MediaFetcher,
    MessageDedup, MessageSender, Mode, OcrEngine, OcrError, Profile, SecurityBot, UserLocks,
    UserStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// AI
// ============================================================================

/// AI double answering from per-mode queues.
///
/// An exhausted queue behaves like a transport failure.
#[derive(Default)]
pub struct ScriptedAi {
    replies: Mutex<HashMap<Mode, VecDeque<Result<String, String>>>>,
    calls: Mutex<Vec<(Mode, String)>>,
    delay: Option<Duration>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps first, so concurrent turns overlap
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push(&self, mode: Mode, reply: &str) {
        self.replies
            .lock()
            .entry(mode)
            .or_default()
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, mode: Mode) {
        self.replies
            .lock()
            .entry(mode)
            .or_default()
            .push_back(Err("scripted failure".to_string()));
    }

    pub fn calls(&self) -> Vec<(Mode, String)> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, mode: Mode) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| *m == mode)
            .map(|(_, input)| input.clone())
            .collect()
    }
}

#[async_trait]
impl AiClient for ScriptedAi {
    async fn complete(&self, mode: Mode, input: &str, _profile: &Profile) -> Result<String, AiError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push((mode, input.to_string()));

        let next = self.replies.lock().get_mut(&mode).and_then(|q| q.pop_front());
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(AiError::Transport(e)),
            None => Err(AiError::Transport(format!("no scripted reply for {}", mode))),
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// Sender double keeping every outbound message in order
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Texts sent to one phone, oldest first
    pub fn texts_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == phone)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_to(&self, phone: &str) -> Option<String> {
        self.texts_to(phone).pop()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<String, ChannelError> {
        let mut sent = self.sent.lock();
        sent.push((to.to_string(), text.to_string()));
        Ok(format!("wamid.out.{}", sent.len()))
    }
}

/// Media double returning fixed bytes, or failing when it has none
pub struct FakeMedia {
    bytes: Option<Vec<u8>>,
}

impl FakeMedia {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Some(bytes.to_vec()),
        }
    }

    pub fn failing() -> Self {
        Self { bytes: None }
    }
}

#[async_trait]
impl MediaFetcher for FakeMedia {
    async fn fetch_image(&self, media_id: &str) -> Result<Vec<u8>, ChannelError> {
        self.bytes
            .clone()
            .ok_or_else(|| ChannelError::MediaDownloadFailed(format!("no media {}", media_id)))
    }
}

/// OCR double returning fixed text, or reporting a missing engine
pub struct FakeOcr {
    text: Option<String>,
}

impl FakeOcr {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn missing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<String, OcrError> {
        self.text
            .clone()
            .ok_or_else(|| OcrError::EngineMissing("tesseract".to_string()))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A bot wired to doubles, with a temporary image archive
pub struct Harness {
    pub bot: SecurityBot,
    pub ai: Arc<ScriptedAi>,
    pub sender: Arc<RecordingSender>,
    pub store: Arc<UserStore>,
    pub images: TempDir,
    next_id: AtomicU64,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            ScriptedAi::new(),
            FakeMedia::with_bytes(b"\xff\xd8fake-jpeg"),
            FakeOcr::with_text(""),
        )
    }

    pub fn with_ai(ai: ScriptedAi) -> Self {
        Self::build(ai, FakeMedia::with_bytes(b"\xff\xd8fake-jpeg"), FakeOcr::with_text(""))
    }

    pub fn build(ai: ScriptedAi, media: FakeMedia, ocr: FakeOcr) -> Self {
        let store = UserStore::open_in_memory().expect("in-memory store");
        Self::assemble(store, TempDir::new().expect("temp dir"), ai, media, ocr)
    }

    /// Store backed by a database file that `raw_db` can reach behind the bot
    pub fn on_disk(ai: ScriptedAi) -> Self {
        let images = TempDir::new().expect("temp dir");
        let store = UserStore::open(&images.path().join(DB_FILE)).expect("file store");
        Self::assemble(
            store,
            images,
            ai,
            FakeMedia::with_bytes(b"\xff\xd8fake-jpeg"),
            FakeOcr::with_text(""),
        )
    }

    fn assemble(
        store: UserStore,
        images: TempDir,
        ai: ScriptedAi,
        media: FakeMedia,
        ocr: FakeOcr,
    ) -> Self {
        let store = Arc::new(store);
        let ai = Arc::new(ai);
        let sender = Arc::new(RecordingSender::new());

        let bot = SecurityBot::new(BotDeps {
            store: store.clone(),
            ai: ai.clone(),
            sender: sender.clone(),
            media: Arc::new(media),
            ocr: Arc::new(ocr),
            archive: Arc::new(ImageArchive::new(images.path().join("imagenes"))),
            dedup: Arc::new(MessageDedup::default()),
            locks: Arc::new(UserLocks::new()),
        });

        Self {
            bot,
            ai,
            sender,
            store,
            images,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn fresh_id(&self) -> String {
        format!("wamid.test.{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Deliver a text message with a fresh id
    pub async fn say(&self, phone: &str, text: &str) -> Disposition {
        let id = self.fresh_id();
        self.bot
            .handle_inbound(InboundMessage::text(&id, phone, text))
            .await
            .expect("message handled")
    }

    pub async fn deliver(&self, msg: InboundMessage) -> Disposition {
        self.bot.handle_inbound(msg).await.expect("message handled")
    }

    /// Seed a fully onboarded user without going through the dialogue
    pub fn register(&self, phone: &str, name: &str) {
        self.store.create(phone).expect("create user");
        self.store
            .update(
                phone,
                &UserUpdate::new()
                    .accepted_terms(true)
                    .name(name)
                    .age(40)
                    .knowledge(KnowledgeLevel::Little)
                    .state(UserState::Registered),
            )
            .expect("seed profile");
    }

    /// Force a persisted state
    pub fn set_state(&self, phone: &str, state: UserState) {
        self.store
            .update(phone, &UserUpdate::new().state(state))
            .expect("set state");
    }

    pub fn user(&self, phone: &str) -> UserRecord {
        self.store
            .get(phone)
            .expect("store read")
            .expect("user exists")
    }

    pub fn state(&self, phone: &str) -> Option<UserState> {
        self.user(phone).state()
    }

    /// Direct connection to an `on_disk` harness database
    pub fn raw_db(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(self.images.path().join(DB_FILE)).expect("raw connection")
    }

    /// Make every later update of `usuarios` fail
    pub fn break_user_writes(&self) {
        self.raw_db()
            .execute_batch(
                "CREATE TRIGGER fail_user_writes BEFORE UPDATE ON usuarios \
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
            )
            .expect("install trigger");
    }
}

const DB_FILE: &str = "usuarios_bot.db";

/// Analysis reply whose full report ends with the SÍ/NO/AYUDA question
pub const INTERACTIVE_REPORT: &str = "Short risk summary---DETALLES_SIGUEN---Full report. \
     ¿Llegaste a hacer clic en el enlace? Responde sí o no, o escribe AYUDA si necesitas pasos.";

/// Poll until `check` holds or the timeout expires
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
