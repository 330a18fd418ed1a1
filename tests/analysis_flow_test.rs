//! Analysis Flow Integration Tests
//!
//! Summary-then-details reveal and the post-incident sub-dialogue.

mod common;

use common::{Harness, ScriptedAi, INTERACTIVE_REPORT};
use securitybot_wa::replies;
use securitybot_wa::store::UserState;
use securitybot_wa::{InboundMessage, Mode};

const PHONE: &str = "3000000001";
const SUSPICIOUS: &str = "Tu cuenta fue bloqueada, entra a https://banco-falso.co/login ya";

/// Registered user whose last message produced a parked interactive report
async fn analysed(ai: ScriptedAi) -> Harness {
    ai.push(Mode::ClassifyIntent, "analizar");
    ai.push(Mode::AnalyzeForScam, INTERACTIVE_REPORT);
    let h = Harness::with_ai(ai);
    h.register(PHONE, "Carlos");
    h.say(PHONE, SUSPICIOUS).await;
    h
}

#[tokio::test]
async fn test_summary_parks_full_report() {
    let h = analysed(ScriptedAi::new()).await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::AwaitingDetailChoice));
    let detail = user.pending_detail.unwrap();
    assert!(detail.starts_with("Full report."));
    assert!(!detail.contains("Short risk summary"));
    assert_eq!(
        user.last_analyzed_url.as_deref(),
        Some("https://banco-falso.co/login")
    );
    // Text analysis carries no image provenance
    assert!(user.image.is_none());

    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::analysis_ack("Carlos"),
            "Short risk summary".to_string(),
            replies::ask_for_details("Carlos"),
        ]
    );
}

#[tokio::test]
async fn test_unsaved_analysis_ends_in_apology() {
    let ai = ScriptedAi::new();
    ai.push(Mode::ClassifyIntent, "analizar");
    ai.push(Mode::AnalyzeForScam, INTERACTIVE_REPORT);
    let h = Harness::on_disk(ai);
    h.register(PHONE, "Carlos");
    h.break_user_writes();

    let result = h
        .bot
        .handle_inbound(InboundMessage::text("wamid.unsaved", PHONE, SUSPICIOUS))
        .await;

    assert!(result.is_err());
    assert_eq!(h.state(PHONE), Some(UserState::Registered));
    assert!(h.user(PHONE).pending_detail.is_none());
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::analysis_ack("Carlos"),
            replies::analysis_failed("Carlos"),
        ]
    );
}

#[tokio::test]
async fn test_reveal_arms_incident_dialogue() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecideWantsDetails, "QUIERE_DETALLES");
    let h = analysed(ai).await;
    let parked = h.user(PHONE).pending_detail.unwrap();
    h.sender.clear();

    h.say(PHONE, "sí quiero").await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::AwaitingIncidentReply));
    assert!(user.pending_detail.is_none());
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![parked, replies::ask_feedback("Carlos")]
    );
}

#[tokio::test]
async fn test_reveal_without_question_returns_to_registered() {
    let ai = ScriptedAi::new();
    ai.push(Mode::ClassifyIntent, "analizar");
    ai.push(
        Mode::AnalyzeForScam,
        "Parece legítimo---DETALLES_SIGUEN---El mensaje no muestra señales de fraude.",
    );
    ai.push(Mode::DecideWantsDetails, "QUIERE_DETALLES");
    let h = Harness::with_ai(ai);
    h.register(PHONE, "Carlos");

    h.say(PHONE, "¿Este mensaje de mi banco es real?").await;
    h.say(PHONE, "dale").await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::Registered));
    assert!(user.pending_detail.is_none());
    assert!(h
        .sender
        .texts_to(PHONE)
        .contains(&"El mensaje no muestra señales de fraude.".to_string()));
}

#[tokio::test]
async fn test_reveal_with_nothing_parked() {
    let ai = ScriptedAi::new();
    ai.push(Mode::ClassifyIntent, "analizar");
    ai.push(Mode::AnalyzeForScam, "Solo un resumen sin separador");
    ai.push(Mode::DecideWantsDetails, "QUIERE_DETALLES");
    let h = Harness::with_ai(ai);
    h.register(PHONE, "Carlos");

    h.say(PHONE, SUSPICIOUS).await;
    assert_eq!(h.state(PHONE), Some(UserState::AwaitingDetailChoice));
    h.say(PHONE, "sí").await;

    assert_eq!(h.state(PHONE), Some(UserState::Registered));
    assert_eq!(h.sender.last_to(PHONE).unwrap(), replies::details_missing());
}

#[tokio::test]
async fn test_something_else_is_dispatched_as_new_message() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecideWantsDetails, "OTRA_COSA");
    ai.push(Mode::ClassifyIntent, "solicitar_tip_seguridad");
    let h = analysed(ai).await;
    h.sender.clear();

    h.say(PHONE, "mejor dame un consejo").await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::Registered));
    assert!(user.pending_detail.is_none());
    assert_eq!(
        h.ai.calls_for(Mode::ClassifyIntent).last().map(String::as_str),
        Some("mejor dame un consejo")
    );
    let sent = h.sender.texts_to(PHONE);
    assert_eq!(sent.len(), 1);
    assert!(replies::SECURITY_TIPS.iter().any(|tip| sent[0].contains(tip)));
}

#[tokio::test]
async fn test_unclear_detail_choice_keeps_report_parked() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecideWantsDetails, "NO_SE");
    let h = analysed(ai).await;

    h.say(PHONE, "mmm").await;
    // Failed call: queue exhausted
    h.say(PHONE, "eh").await;
    // Blank text never reaches the AI
    h.say(PHONE, "  ").await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::AwaitingDetailChoice));
    assert!(user.pending_detail.is_some());
    assert_eq!(h.ai.calls_for(Mode::DecideWantsDetails).len(), 2);
    assert_eq!(
        h.sender.last_to(PHONE).unwrap(),
        replies::details_choice_unclear("Carlos")
    );
}

#[tokio::test]
async fn test_analysis_failure_leaves_state_unchanged() {
    let ai = ScriptedAi::new();
    ai.push(Mode::ClassifyIntent, "analizar");
    ai.push_failure(Mode::AnalyzeForScam);
    let h = Harness::with_ai(ai);
    h.register(PHONE, "Carlos");

    h.say(PHONE, SUSPICIOUS).await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::Registered));
    assert!(user.pending_detail.is_none());
    assert!(user.last_analyzed_url.is_none());
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::analysis_ack("Carlos"),
            replies::analysis_failed("Carlos"),
        ]
    );
}

/// Harness parked in the incident sub-dialogue
async fn in_incident(ai: ScriptedAi) -> Harness {
    ai.push(Mode::DecideWantsDetails, "QUIERE_DETALLES");
    let h = analysed(ai).await;
    h.say(PHONE, "sí quiero").await;
    assert_eq!(h.state(PHONE), Some(UserState::AwaitingIncidentReply));
    h.sender.clear();
    h
}

#[tokio::test]
async fn test_question_inside_incident_keeps_waiting() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecidePostIncidentReply, "ES_PREGUNTA");
    ai.push(
        Mode::AnswerSecurityQuestion,
        "El phishing es un engaño para robar tus datos.",
    );
    let h = in_incident(ai).await;

    h.say(PHONE, "¿qué es el phishing?").await;

    assert_eq!(h.state(PHONE), Some(UserState::AwaitingIncidentReply));
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::incident_question_ack("Carlos", "¿qué es el phishing?"),
            "El phishing es un engaño para robar tus datos.".to_string(),
            replies::incident_reprompt_after_digression("Carlos"),
        ]
    );
    // The analysed URL survives the digression
    assert!(h.user(PHONE).last_analyzed_url.is_some());
}

#[tokio::test]
async fn test_yes_sends_help_and_concludes() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecidePostIncidentReply, "RESPUESTA_SI");
    ai.push(Mode::GenerateHelpSteps, "1. Cambia tu contraseña. 2. Llama a tu banco.");
    let h = in_incident(ai).await;

    h.say(PHONE, "sí, le di clic").await;

    let user = h.user(PHONE);
    assert_eq!(user.state(), Some(UserState::Registered));
    assert!(user.last_analyzed_url.is_none());
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::incident_yes_ack("Carlos"),
            "1. Cambia tu contraseña. 2. Llama a tu banco.".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_help_steps_failure_still_concludes() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecidePostIncidentReply, "PIDE_AYUDA");
    let h = in_incident(ai).await;

    h.say(PHONE, "AYUDA").await;

    assert_eq!(h.state(PHONE), Some(UserState::Registered));
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::incident_help_ack("Carlos"),
            replies::help_steps_failed("Carlos"),
        ]
    );
}

#[tokio::test]
async fn test_no_concludes() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecidePostIncidentReply, "RESPUESTA_NO");
    let h = in_incident(ai).await;

    h.say(PHONE, "no").await;

    assert_eq!(h.state(PHONE), Some(UserState::Registered));
    assert_eq!(h.sender.texts_to(PHONE), vec![replies::incident_no("Carlos")]);
}

#[tokio::test]
async fn test_comment_and_unclear_re_prompt() {
    let ai = ScriptedAi::new();
    ai.push(Mode::DecidePostIncidentReply, "ES_COMENTARIO");
    ai.push(Mode::DecidePostIncidentReply, "OTRA_COSA");
    let h = in_incident(ai).await;

    h.say(PHONE, "gracias").await;
    h.say(PHONE, "hoy llueve").await;
    // Classifier failure behaves like OTRA_COSA
    h.say(PHONE, "bueno").await;

    assert_eq!(h.state(PHONE), Some(UserState::AwaitingIncidentReply));
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![
            replies::incident_comment_thanks("Carlos"),
            replies::incident_reprompt("Carlos"),
            replies::incident_reprompt("Carlos"),
        ]
    );
    assert_eq!(h.ai.calls_for(Mode::DecidePostIncidentReply).len(), 3);
}

#[tokio::test]
async fn test_image_during_incident_asks_for_text() {
    let h = in_incident(ScriptedAi::new()).await;

    h.deliver(InboundMessage::image("wamid.img.9", PHONE, Some("media-9")))
        .await;

    assert_eq!(h.state(PHONE), Some(UserState::AwaitingIncidentReply));
    assert_eq!(
        h.sender.texts_to(PHONE),
        vec![replies::incident_needs_text("Carlos")]
    );
}
