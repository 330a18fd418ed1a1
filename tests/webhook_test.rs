//! Webhook HTTP Integration Tests
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{Harness, ScriptedAi};
use securitybot_wa::replies;
use securitybot_wa::server::{router, AppState};
use securitybot_wa::store::UserState;
use serde_json::{json, Value};
use tower::ServiceExt;

const PHONE: &str = "573000000008";

fn app(h: &Harness, verify_token: Option<&str>) -> Router {
    router(AppState {
        bot: h.bot.clone(),
        verify_token: verify_token.map(str::to_string),
    })
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn text_payload(id: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "messages": [{
                        "from": PHONE,
                        "id": id,
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let h = Harness::new();

    let response = app(&h, Some("secreto"))
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=secreto&hub.challenge=1158201444")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "1158201444");
}

#[tokio::test]
async fn test_verification_rejects_wrong_or_unset_token() {
    let h = Harness::new();
    let uri = "/webhook?hub.mode=subscribe&hub.verify_token=otro&hub.challenge=1";

    let wrong = app(&h, Some("secreto"))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let unset = app(&h, None)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unset.status(), StatusCode::FORBIDDEN);

    let wrong_mode = app(&h, Some("otro"))
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=unsubscribe&hub.verify_token=otro&hub.challenge=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong_mode.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_text_delivery_reaches_bot() {
    let h = Harness::new();

    let response = app(&h, None)
        .oneshot(post(text_payload("wamid.http.1", "Hola").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "{}");
    assert_eq!(h.state(PHONE), Some(UserState::AwaitingTerms));
    assert_eq!(h.sender.texts_to(PHONE), vec![replies::welcome_terms()]);
}

#[tokio::test]
async fn test_redelivery_is_acknowledged_without_side_effects() {
    let h = Harness::new();
    let payload = text_payload("wamid.http.2", "Hola").to_string();

    let first = app(&h, None).oneshot(post(payload.clone())).await.unwrap();
    let second = app(&h, None).oneshot(post(payload)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(h.sender.count(), 1);
}

#[tokio::test]
async fn test_failed_write_returns_server_error() {
    let h = Harness::on_disk(ScriptedAi::new());
    h.say(PHONE, "Hola").await;
    h.sender.clear();
    h.break_user_writes();

    let response = app(&h, None)
        .oneshot(post(text_payload("wamid.http.3", "ACEPTO").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(h.sender.count(), 0);
    assert_eq!(h.state(PHONE), Some(UserState::AwaitingTerms));
}

#[tokio::test]
async fn test_malformed_payload_is_discarded() {
    let h = Harness::new();

    let garbage = app(&h, None).oneshot(post("not json {")).await.unwrap();
    assert_eq!(garbage.status(), StatusCode::OK);
    assert_eq!(body_text(garbage).await, "{}");

    let wrong_shape = app(&h, None)
        .oneshot(post(json!({"entry": "nope"}).to_string()))
        .await
        .unwrap();
    assert_eq!(wrong_shape.status(), StatusCode::OK);

    let no_sender = json!({
        "entry": [{"changes": [{"value": {"messages": [{"id": "wamid.x", "type": "text"}]}}]}]
    });
    let response = app(&h, None)
        .oneshot(post(no_sender.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.sender.count(), 0);
    assert!(h.store.get(PHONE).unwrap().is_none());
}

#[tokio::test]
async fn test_status_callback_is_acknowledged() {
    let h = Harness::new();
    let statuses = json!({
        "entry": [{"changes": [{"value": {
            "statuses": [{"id": "wamid.out.1", "status": "delivered"}]
        }}]}]
    });

    let response = app(&h, None)
        .oneshot(post(statuses.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.sender.count(), 0);
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();

    let response = app(&h, None)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
