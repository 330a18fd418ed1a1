//! Webhook HTTP Server
//!
//! Axum server exposing the WhatsApp Cloud API webhook (verification
//! handshake + delivery endpoint) and a health probe, with request tracing
//! and graceful shutdown.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::bot::SecurityBot;
use crate::channels::WebhookPayload;

/// How often idle per-user locks are dropped
pub const LOCK_PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub bot: SecurityBot,
    /// Handshake token; `None` rejects every verification attempt
    pub verify_token: Option<String>,
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server and run until shutdown signal
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let pruner = spawn_lock_pruner(state.bot.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Webhook server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pruner.abort();
    info!("Webhook server shut down gracefully");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Subscription handshake: echo the challenge when the token matches
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let token_matches = matches!(
        (state.verify_token.as_deref(), params.verify_token.as_deref()),
        (Some(expected), Some(given)) if expected == given
    );

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        info!("Webhook verification succeeded");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        warn!("Webhook verification failed");
        (StatusCode::FORBIDDEN, "Verification token mismatch.").into_response()
    }
}

/// Message delivery.
///
/// Malformed payloads and payloads without a message are acknowledged with
/// an empty body so the platform does not retry them.
async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Discarding malformed webhook payload: {}", e);
            return (StatusCode::OK, Json(json!({})));
        }
    };

    let Some(message) = payload.first_message() else {
        debug!("Webhook without a message ignored");
        return (StatusCode::OK, Json(json!({})));
    };

    let message_id = message.id.clone();
    match state.bot.handle_inbound(message).await {
        Ok(disposition) => {
            debug!(message_id = %message_id, ?disposition, "Webhook handled");
            (StatusCode::OK, Json(json!({})))
        }
        Err(e) => {
            error!(message_id = %message_id, "Failed to handle message: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error"})),
            )
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn spawn_lock_pruner(bot: SecurityBot) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LOCK_PRUNE_INTERVAL);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            bot.locks().prune_idle();
        }
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
