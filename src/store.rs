//! User Record Store
//!
//! One row per phone number holding the onboarding profile, the persisted
//! conversation state and the transient analysis fields. Also keeps an
//! append-only log of archived images and thumbs feedback.
//!
//! Column names predate this crate and are kept so existing databases
//! open unchanged.

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

use crate::ai::Profile;

/// Conversation state; the integer codes are the persisted representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserState {
    AwaitingTerms,
    AwaitingName,
    AwaitingAge,
    AwaitingKnowledge,
    Registered,
    AwaitingIncidentReply,
    AwaitingDetailChoice,
}

impl UserState {
    pub fn code(&self) -> i64 {
        match self {
            Self::AwaitingTerms => 0,
            Self::AwaitingName => 1,
            Self::AwaitingAge => 2,
            Self::AwaitingKnowledge => 3,
            Self::Registered => 4,
            Self::AwaitingIncidentReply => 5,
            Self::AwaitingDetailChoice => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::AwaitingTerms),
            1 => Some(Self::AwaitingName),
            2 => Some(Self::AwaitingAge),
            3 => Some(Self::AwaitingKnowledge),
            4 => Some(Self::Registered),
            5 => Some(Self::AwaitingIncidentReply),
            6 => Some(Self::AwaitingDetailChoice),
            _ => None,
        }
    }

    /// Still collecting the profile
    pub fn is_onboarding(&self) -> bool {
        self.code() < Self::Registered.code()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingTerms => "awaiting_terms",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingAge => "awaiting_age",
            Self::AwaitingKnowledge => "awaiting_knowledge",
            Self::Registered => "registered",
            Self::AwaitingIncidentReply => "awaiting_incident_reply",
            Self::AwaitingDetailChoice => "awaiting_detail_choice",
        }
    }
}

/// Self-reported cybersecurity knowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeLevel {
    Yes,
    No,
    Little,
}

impl KnowledgeLevel {
    /// Literal stored in the database and shown to the AI
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Sí",
            Self::No => "No",
            Self::Little => "Poco",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Sí" | "Si" => Some(Self::Yes),
            "No" => Some(Self::No),
            "Poco" => Some(Self::Little),
            _ => None,
        }
    }
}

/// Where an analysed text came from when it was read off an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProvenance {
    pub ocr_text: String,
    pub raw_analysis: String,
    /// Archived file name
    pub image_ref: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Persisted user record
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub phone: String,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub knowledge: Option<KnowledgeLevel>,
    pub accepted_terms: bool,
    /// Raw state code; see [`UserRecord::state`]
    pub state_code: i64,
    pub pending_detail: Option<String>,
    pub last_analyzed_url: Option<String>,
    pub image: Option<ImageProvenance>,
}

impl UserRecord {
    /// `None` when the stored code is not a known state
    pub fn state(&self) -> Option<UserState> {
        UserState::from_code(self.state_code)
    }

    /// Name used in replies, with a neutral fallback
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("tú")
    }

    /// Profile fields handed to the AI collaborator
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            age: self.age,
            knowledge: self.knowledge,
            last_analyzed_url: self.last_analyzed_url.clone(),
        }
    }

    /// Onboarding finished with every profile field present
    pub fn profile_complete(&self) -> bool {
        self.accepted_terms && self.name.is_some() && self.age.is_some() && self.knowledge.is_some()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let knowledge: Option<String> = row.get("conocimiento")?;
        let ocr_text: Option<String> = row.get("last_image_ocr_text")?;
        let raw_analysis: Option<String> = row.get("last_image_analysis_raw")?;
        let image_ref: Option<String> = row.get("last_image_id_processed")?;
        let timestamp: Option<String> = row.get("last_image_timestamp")?;

        let image = match (ocr_text, raw_analysis, image_ref, timestamp) {
            (Some(ocr_text), Some(raw_analysis), Some(image_ref), Some(timestamp)) => {
                Some(ImageProvenance {
                    ocr_text,
                    raw_analysis,
                    image_ref,
                    timestamp,
                })
            }
            _ => None,
        };

        Ok(Self {
            phone: row.get("telefono")?,
            name: row.get("nombre")?,
            age: row.get("edad")?,
            knowledge: knowledge.as_deref().and_then(KnowledgeLevel::parse),
            accepted_terms: row.get::<_, Option<i64>>("acepto_terminos")?.unwrap_or(0) != 0,
            state_code: state_code(row.get_ref("estado")?),
            pending_detail: row.get("last_analysis_details")?,
            last_analyzed_url: row.get("last_analyzed_url")?,
            image,
        })
    }
}

/// Stored state as an integer code; a non-integer value maps to an
/// out-of-range code so routing can recover the user.
fn state_code(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Null => 0,
        ValueRef::Integer(code) => code,
        _ => -1,
    }
}

/// Tri-state change for an optional column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> Patch<T> {
    fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Clear, Patch::Set)
    }
}

/// Partial field set applied in one UPDATE statement
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub state: Option<UserState>,
    pub accepted_terms: Option<bool>,
    pub name: Patch<String>,
    pub age: Patch<i64>,
    pub knowledge: Patch<KnowledgeLevel>,
    pub pending_detail: Patch<String>,
    pub last_analyzed_url: Patch<String>,
    pub image: Patch<ImageProvenance>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: UserState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn accepted_terms(mut self, accepted: bool) -> Self {
        self.accepted_terms = Some(accepted);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Patch::Set(name.into());
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = Patch::Set(age);
        self
    }

    pub fn knowledge(mut self, level: KnowledgeLevel) -> Self {
        self.knowledge = Patch::Set(level);
        self
    }

    pub fn pending_detail(mut self, detail: impl Into<String>) -> Self {
        self.pending_detail = Patch::Set(detail.into());
        self
    }

    pub fn clear_pending_detail(mut self) -> Self {
        self.pending_detail = Patch::Clear;
        self
    }

    pub fn last_analyzed_url(mut self, url: Option<String>) -> Self {
        self.last_analyzed_url = url.into();
        self
    }

    pub fn clear_last_analyzed_url(mut self) -> Self {
        self.last_analyzed_url = Patch::Clear;
        self
    }

    pub fn image(mut self, provenance: ImageProvenance) -> Self {
        self.image = Patch::Set(provenance);
        self
    }

    /// Clear pending detail, image provenance and last URL
    pub fn clear_transients(mut self) -> Self {
        self.pending_detail = Patch::Clear;
        self.last_analyzed_url = Patch::Clear;
        self.image = Patch::Clear;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.accepted_terms.is_none()
            && self.name.is_keep()
            && self.age.is_keep()
            && self.knowledge.is_keep()
            && self.pending_detail.is_keep()
            && self.last_analyzed_url.is_keep()
            && self.image.is_keep()
    }

    /// Column assignments in a fixed order
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        fn text(patch: &Patch<String>) -> Option<Value> {
            match patch {
                Patch::Keep => None,
                Patch::Set(s) => Some(Value::Text(s.clone())),
                Patch::Clear => Some(Value::Null),
            }
        }

        let mut out = Vec::new();
        if let Some(state) = self.state {
            out.push(("estado", Value::Integer(state.code())));
        }
        if let Some(accepted) = self.accepted_terms {
            out.push(("acepto_terminos", Value::Integer(i64::from(accepted))));
        }
        if let Some(v) = text(&self.name) {
            out.push(("nombre", v));
        }
        match self.age {
            Patch::Keep => {}
            Patch::Set(age) => out.push(("edad", Value::Integer(age))),
            Patch::Clear => out.push(("edad", Value::Null)),
        }
        match self.knowledge {
            Patch::Keep => {}
            Patch::Set(level) => out.push(("conocimiento", Value::Text(level.as_str().to_string()))),
            Patch::Clear => out.push(("conocimiento", Value::Null)),
        }
        if let Some(v) = text(&self.pending_detail) {
            out.push(("last_analysis_details", v));
        }
        if let Some(v) = text(&self.last_analyzed_url) {
            out.push(("last_analyzed_url", v));
        }
        match &self.image {
            Patch::Keep => {}
            Patch::Set(p) => {
                out.push(("last_image_ocr_text", Value::Text(p.ocr_text.clone())));
                out.push(("last_image_analysis_raw", Value::Text(p.raw_analysis.clone())));
                out.push(("last_image_id_processed", Value::Text(p.image_ref.clone())));
                out.push(("last_image_timestamp", Value::Text(p.timestamp.clone())));
            }
            Patch::Clear => {
                for column in [
                    "last_image_ocr_text",
                    "last_image_analysis_raw",
                    "last_image_id_processed",
                    "last_image_timestamp",
                ] {
                    out.push((column, Value::Null));
                }
            }
        }
        out
    }
}

/// User store with SQLite backend
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open or create the user database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening user database {}", path.display()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        info!("User store opened: {}", path.display());
        Ok(store)
    }

    /// In-memory store (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS usuarios (
                telefono TEXT PRIMARY KEY,
                nombre TEXT,
                edad INTEGER,
                conocimiento TEXT,
                acepto_terminos INTEGER DEFAULT 0,
                estado INTEGER DEFAULT 0,
                last_analysis_details TEXT,
                last_image_ocr_text TEXT,
                last_image_analysis_raw TEXT,
                last_image_id_processed TEXT,
                last_image_timestamp TEXT,
                last_analyzed_url TEXT
            );

            CREATE TABLE IF NOT EXISTS imagenes_procesadas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telefono_usuario TEXT NOT NULL,
                nombre_archivo_imagen TEXT NOT NULL,
                timestamp INTEGER NOT NULL DEFAULT (unixepoch()),
                FOREIGN KEY (telefono_usuario) REFERENCES usuarios(telefono)
            );

            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                telefono_usuario TEXT NOT NULL,
                valor TEXT NOT NULL CHECK(valor IN ('positive', 'negative')),
                timestamp INTEGER NOT NULL DEFAULT (unixepoch())
            );

            CREATE INDEX IF NOT EXISTS idx_imagenes_telefono
                ON imagenes_procesadas(telefono_usuario);
            "#,
        )?;
        Ok(())
    }

    /// Load a user record
    pub fn get(&self, phone: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT * FROM usuarios WHERE telefono = ?1",
                params![phone],
                UserRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert an empty record in `AwaitingTerms`.
    ///
    /// Returns `false` when the phone already exists; that is not an error.
    pub fn create(&self, phone: &str) -> Result<bool> {
        let inserted = self.conn.lock().execute(
            "INSERT OR IGNORE INTO usuarios (telefono, acepto_terminos, estado) VALUES (?1, 0, ?2)",
            params![phone, UserState::AwaitingTerms.code()],
        )?;
        if inserted == 0 {
            debug!("Duplicate create ignored for {}", phone);
        }
        Ok(inserted == 1)
    }

    /// Load the record, creating it first if this phone is new.
    ///
    /// The flag is `true` when this call created the record.
    pub fn get_or_create(&self, phone: &str) -> Result<(UserRecord, bool)> {
        let created = self.create(phone)?;
        let record = self
            .get(phone)?
            .with_context(|| format!("user {} missing right after create", phone))?;
        Ok((record, created))
    }

    /// Apply a partial update as a single statement
    pub fn update(&self, phone: &str, update: &UserUpdate) -> Result<()> {
        let assignments = update.assignments();
        if assignments.is_empty() {
            debug!("Empty update for {} skipped", phone);
            return Ok(());
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE usuarios SET {} WHERE telefono = ?", set_clause);

        let values = assignments
            .into_iter()
            .map(|(_, value)| value)
            .chain(std::iter::once(Value::Text(phone.to_string())));

        let changed = self
            .conn
            .lock()
            .execute(&sql, params_from_iter(values))
            .with_context(|| format!("updating user {}", phone))?;

        if changed == 0 {
            bail!("no user record for {}", phone);
        }

        debug!("Updated user {}: {}", phone, set_clause);
        Ok(())
    }

    /// Append to the archived image log
    pub fn record_image(&self, phone: &str, file_name: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO imagenes_procesadas (telefono_usuario, nombre_archivo_imagen) VALUES (?1, ?2)",
            params![phone, file_name],
        )?;
        Ok(())
    }

    /// Archived image file names for a phone, oldest first
    pub fn images_for(&self, phone: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT nombre_archivo_imagen FROM imagenes_procesadas
             WHERE telefono_usuario = ?1
             ORDER BY id ASC",
        )?;
        let names = stmt
            .query_map(params![phone], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Append a thumbs reaction
    pub fn record_feedback(&self, phone: &str, value: &str) -> Result<()> {
        self.conn.lock().execute(
            "INSERT INTO feedback (telefono_usuario, valor) VALUES (?1, ?2)",
            params![phone, value],
        )?;
        Ok(())
    }

    /// Feedback values for a phone, oldest first
    pub fn feedback_for(&self, phone: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT valor FROM feedback WHERE telefono_usuario = ?1 ORDER BY id ASC",
        )?;
        let values = stmt
            .query_map(params![phone], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    /// Overwrite the raw state code (maintenance and recovery tests)
    pub fn set_state_code(&self, phone: &str, code: i64) -> Result<()> {
        let changed = self.conn.lock().execute(
            "UPDATE usuarios SET estado = ?1 WHERE telefono = ?2",
            params![code, phone],
        )?;
        if changed == 0 {
            bail!("no user record for {}", phone);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for code in 0..=6 {
            let state = UserState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(UserState::from_code(7), None);
        assert!(UserState::AwaitingKnowledge.is_onboarding());
        assert!(!UserState::Registered.is_onboarding());
        assert!(!UserState::AwaitingDetailChoice.is_onboarding());
    }

    #[test]
    fn test_knowledge_literals() {
        assert_eq!(KnowledgeLevel::parse("Sí"), Some(KnowledgeLevel::Yes));
        assert_eq!(KnowledgeLevel::parse(" Poco "), Some(KnowledgeLevel::Little));
        assert_eq!(KnowledgeLevel::parse("CONOCIMIENTO_AMBIGUO"), None);
        assert_eq!(KnowledgeLevel::Little.as_str(), "Poco");
    }

    #[test]
    fn test_empty_update_has_no_assignments() {
        let update = UserUpdate::new();
        assert!(update.is_empty());
        assert!(update.assignments().is_empty());
    }

    #[test]
    fn test_clear_transients_nulls_every_transient_column() {
        let columns: Vec<&str> = UserUpdate::new()
            .clear_transients()
            .assignments()
            .into_iter()
            .map(|(column, value)| {
                assert_eq!(value, Value::Null);
                column
            })
            .collect();
        assert!(columns.contains(&"last_analysis_details"));
        assert!(columns.contains(&"last_analyzed_url"));
        assert!(columns.contains(&"last_image_timestamp"));
        assert_eq!(columns.len(), 6);
    }

    #[test]
    fn test_display_name_fallback() {
        let store = UserStore::open_in_memory().unwrap();
        let (user, created) = store.get_or_create("3000000000").unwrap();
        assert!(created);
        assert_eq!(user.display_name(), "tú");
        assert_eq!(user.state(), Some(UserState::AwaitingTerms));
    }
}
