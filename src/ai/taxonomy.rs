//! Output Taxonomies
//!
//! Parsers for the literal replies each classification mode is instructed
//! to produce. Anything outside the taxonomy parses to the mode's unclear
//! variant (or `None`), never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::KnowledgeLevel;
use crate::text::title_case;

/// Literal splitting the short summary from the full report
pub const DETAIL_SEPARATOR: &str = "---DETALLES_SIGUEN---";

static AGE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^EDAD_VALIDA:\s*(-?\d+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOutcome {
    Valid(String),
    Invalid,
    Unclear,
}

impl NameOutcome {
    /// `NOMBRE_VALIDO:<name>` / `NOMBRE_INVALIDO` / `NOMBRE_CONFUSO`
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        if let Some(name) = reply.strip_prefix("NOMBRE_VALIDO:") {
            let name = name.trim().trim_matches(|c| c == '"' || c == '\'' || c == '.');
            if name.is_empty() {
                return NameOutcome::Unclear;
            }
            return NameOutcome::Valid(title_case(name));
        }
        if reply.starts_with("NOMBRE_INVALIDO") {
            NameOutcome::Invalid
        } else {
            NameOutcome::Unclear
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeOutcome {
    /// Parsed number; the plausible range is checked by the caller
    Valid(i64),
    Invalid,
    Unclear,
}

impl AgeOutcome {
    /// `EDAD_VALIDA:<int>` / `EDAD_INVALIDA` / `EDAD_NO_CLARA`
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.starts_with("EDAD_VALIDA") {
            return AGE_VALUE
                .captures(reply)
                .and_then(|caps| caps[1].parse().ok())
                .map_or(AgeOutcome::Unclear, AgeOutcome::Valid);
        }
        if reply.starts_with("EDAD_INVALIDA") {
            AgeOutcome::Invalid
        } else {
            AgeOutcome::Unclear
        }
    }
}

/// `Sí` / `No` / `Poco`, anything else (including `CONOCIMIENTO_AMBIGUO`) is `None`
pub fn parse_knowledge(reply: &str) -> Option<KnowledgeLevel> {
    let cleaned = reply
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '.')
        .trim();
    KnowledgeLevel::parse(cleaned)
}

/// Intent of a message from a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Analyze,
    SecurityQuestion,
    MetaQuestion,
    RequestTip,
    ResetCommand,
    Irrelevant,
}

impl Intent {
    /// Accepts the Spanish labels the model is instructed with and their
    /// English equivalents
    pub fn parse(reply: &str) -> Option<Self> {
        let label = reply
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '.')
            .to_lowercase();
        match label.as_str() {
            "saludo" | "greeting" => Some(Intent::Greeting),
            "analizar" | "analyze" => Some(Intent::Analyze),
            "pregunta_seguridad" | "security_question" => Some(Intent::SecurityQuestion),
            "meta_pregunta" | "meta_question" => Some(Intent::MetaQuestion),
            "solicitar_tip_seguridad" | "request_tip" => Some(Intent::RequestTip),
            "comando_reset" | "reset_command" => Some(Intent::ResetCommand),
            "irrelevante" | "irrelevant" => Some(Intent::Irrelevant),
            _ => None,
        }
    }
}

/// Two-part analysis reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScamReport {
    pub summary: String,
    /// Empty when the separator is absent
    pub detail: String,
    /// Unsplit reply, kept as image provenance
    pub raw: String,
}

impl ScamReport {
    /// Split on the first separator; `None` when there is no summary to send
    pub fn parse(reply: &str) -> Option<Self> {
        let raw = reply.trim();
        let (summary, detail) = match raw.split_once(DETAIL_SEPARATOR) {
            Some((summary, detail)) => (summary.trim(), detail.trim()),
            None => (raw, ""),
        };
        if summary.is_empty() {
            return None;
        }
        Some(ScamReport {
            summary: summary.to_string(),
            detail: detail.to_string(),
            raw: raw.to_string(),
        })
    }
}

/// Answer to "do you want the details?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailChoice {
    WantsDetails,
    SomethingElse,
    Unclear,
}

impl DetailChoice {
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim().to_uppercase();
        if reply.starts_with("QUIERE_DETALLES") {
            DetailChoice::WantsDetails
        } else if reply.starts_with("OTRA_COSA") {
            DetailChoice::SomethingElse
        } else {
            DetailChoice::Unclear
        }
    }
}

/// Reply to "did you click / need help?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentReply {
    Yes,
    No,
    AsksHelp,
    Question,
    Comment,
    /// `OTRA_COSA`, out-of-taxonomy text or a failed call
    Unclear,
}

impl IncidentReply {
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim().to_uppercase();
        if reply.starts_with("RESPUESTA_SI") || reply.starts_with("RESPUESTA_SÍ") {
            IncidentReply::Yes
        } else if reply.starts_with("RESPUESTA_NO") {
            IncidentReply::No
        } else if reply.starts_with("PIDE_AYUDA") {
            IncidentReply::AsksHelp
        } else if reply.starts_with("ES_PREGUNTA") {
            IncidentReply::Question
        } else if reply.starts_with("ES_COMENTARIO") {
            IncidentReply::Comment
        } else {
            IncidentReply::Unclear
        }
    }
}
