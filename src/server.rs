//! Webhook transport.
//!
//! Registers `{public_url}/webhook/{secret}` with Telegram and serves it
//! with axum. The secret is derived from the bot token, so restarts keep
//! the same URL, and Telegram echoes it back in the
//! `X-Telegram-Bot-Api-Secret-Token` header.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/webhook/{secret}` | Telegram update delivery |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Updates are acknowledged with `200 OK` immediately and handled on a
//! spawned task; replies go out through the Bot API, not the response body.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatch::{dispatch, Dispatcher};
use crate::telegram::{TelegramClient, Update};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Webhook secret for a bot token: the first 32 hex digits of its SHA-256.
pub fn webhook_secret(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)[..32].to_string()
}

#[derive(Clone)]
struct AppState {
    secret: Arc<str>,
    client: TelegramClient,
    dispatcher: Arc<Dispatcher>,
}

/// Build the webhook router. Exposed for in-process tests.
pub fn router(secret: &str, client: TelegramClient, dispatcher: Arc<Dispatcher>) -> Router {
    let state = AppState {
        secret: Arc::from(secret),
        client,
        dispatcher,
    };

    Router::new()
        .route("/webhook/{secret}", post(handle_update))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Register the webhook and serve until Ctrl-C.
pub async fn run_webhook(
    config: &Config,
    client: TelegramClient,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    let token = config.bot.require_token()?;
    let public_url = config
        .server
        .public_url
        .as_deref()
        .context("server.public_url is required in webhook mode")?;

    let secret = webhook_secret(token);
    let url = format!("{}/webhook/{}", public_url.trim_end_matches('/'), secret);
    client.set_webhook(&url, &secret).await?;

    let app = router(&secret, client, dispatcher);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(bind = %config.server.bind, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn handle_update(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    let header_ok = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == &*state.secret);
    if secret != &*state.secret || !header_ok {
        tracing::warn!("rejected webhook call with a bad secret");
        return StatusCode::UNAUTHORIZED;
    }

    tokio::spawn(async move {
        dispatch(&state.dispatcher, &state.client, &update).await;
    });
    StatusCode::OK
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
