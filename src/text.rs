//! Text Predicates
//!
//! Normalisation helpers and the fixed rule tables used to recognise
//! terms answers, reset commands, feedback, canned-reply topics and the
//! interactive SÍ/NO/AYUDA prompt inside an analysis report.
//!
//! Every predicate takes text that already went through [`normalize`]
//! unless its name says otherwise.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// `$-_` is a range: it covers digits, path separators and query punctuation.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9]|[$-_@.&+]|[!*(),]|%[0-9a-fA-F]{2})+").unwrap()
});

static TERMS_ACCEPT_EXACT: &[&str] = &["si", "acepto"];
static TERMS_REJECT_EXACT: &[&str] = &["no"];
static TERMS_REJECT_PHRASES: &[&str] = &["no acepto", "no quiero", "no estoy de acuerdo"];

static RESET_PHRASES: &[&str] = &[
    "empezar de nuevo",
    "reset",
    "cancelar",
    "olvidalo",
    "ya no",
    "detente",
];

/// Longer inputs only count as a reset when they are exactly a phrase.
const RESET_MAX_LEN: usize = 30;

static INCIDENT_QUESTION_CUE: &str = "¿llegaste a hacer clic";
static INCIDENT_OPTIONS_CUES: &[&str] = &["sí o no", "si o no"];
static INCIDENT_HELP_CUE: &str = "escribe ayuda";

/// Lowercase, trim and strip combining accents ("Sí, ACEPTO " -> "si, acepto")
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// First http(s) URL in the text, if any
pub fn extract_first_url(text: &str) -> Option<String> {
    URL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Capitalise the first letter of every word, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// First `max_chars` characters, UTF-8 safe
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

pub fn is_terms_rejection(normalized: &str) -> bool {
    TERMS_REJECT_EXACT.contains(&normalized)
        || TERMS_REJECT_PHRASES.iter().any(|p| normalized.contains(p))
}

/// Explicit acceptance; any rejection phrase wins over a contained "acepto"
pub fn is_terms_acceptance(normalized: &str) -> bool {
    if is_terms_rejection(normalized) {
        return false;
    }
    TERMS_ACCEPT_EXACT.contains(&normalized) || normalized.contains("acepto")
}

/// Reset phrase present and the input short enough to mean it
pub fn is_reset_command(normalized: &str) -> bool {
    let has_phrase = RESET_PHRASES.iter().any(|p| normalized.contains(p));
    has_phrase
        && (normalized.chars().count() < RESET_MAX_LEN || RESET_PHRASES.contains(&normalized))
}

/// Whether a full report ends by asking the SÍ/NO/AYUDA interaction question.
///
/// Takes the raw report text; matching is case-insensitive.
pub fn asks_incident_question(report: &str) -> bool {
    let lower = report.to_lowercase();
    lower.contains(INCIDENT_QUESTION_CUE)
        && INCIDENT_OPTIONS_CUES.iter().any(|cue| lower.contains(cue))
        && lower.contains(INCIDENT_HELP_CUE)
}

/// Thumbs reaction sent after a full report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    /// Recognise a message that is only a thumbs emoji (raw text)
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "👍" => Some(Self::Positive),
            "👎" => Some(Self::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

/// Topic of a question about the bot itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaTopic {
    Images,
    Capabilities,
    Audio,
    General,
}

static META_IMAGE_VERBS: &[&str] = &["puedo", "enviar", "mandar"];
static META_CAPABILITY_PHRASES: &[&str] = &["que haces", "para que sirves", "como funcionas"];
static META_AUDIO_VERBS: &[&str] = &["entiendes", "procesas"];

pub fn meta_topic(normalized: &str) -> MetaTopic {
    let any = |words: &[&str]| words.iter().any(|w| normalized.contains(w));

    if normalized.contains("imagen") && any(META_IMAGE_VERBS) {
        MetaTopic::Images
    } else if any(META_CAPABILITY_PHRASES) {
        MetaTopic::Capabilities
    } else if normalized.contains("audio") && any(META_AUDIO_VERBS) {
        MetaTopic::Audio
    } else {
        MetaTopic::General
    }
}

/// Flavour of a side comment made during the incident sub-dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Thanks,
    Acknowledged,
    Other,
}

pub fn comment_kind(normalized: &str) -> CommentKind {
    if normalized.contains("gracias") {
        CommentKind::Thanks
    } else if normalized.contains("ok") || normalized.contains("entendido") {
        CommentKind::Acknowledged
    } else {
        CommentKind::Other
    }
}
