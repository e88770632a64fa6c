//! Minimal Telegram Bot API client.
//!
//! Only the handful of methods and fields the bot needs are modelled.
//! Every call is a JSON `POST` to `{api_base}/bot{token}/{method}`; the
//! response envelope `{ ok, result, description }` is unwrapped into
//! `anyhow::Result`.
//!
//! | Method | Used for |
//! |--------|----------|
//! | `getUpdates` | long polling |
//! | `setWebhook` / `deleteWebhook` | switching delivery mode |
//! | `sendMessage` / `editMessageText` | replies and listing updates |
//! | `answerCallbackQuery` | acknowledging keyboard taps |
//! | `answerInlineQuery` | inline recipe lookups |

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use craftbook_core::models::User;

// ═══════════════════════════════════════════════════════════════════════
// Inbound types
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
}

impl Update {
    /// The user behind whichever payload this update carries.
    pub fn sender(&self) -> Option<&TgUser> {
        if let Some(msg) = &self.message {
            return msg.from.as_ref();
        }
        if let Some(cb) = &self.callback_query {
            return Some(&cb.from);
        }
        self.inline_query.as_ref().map(|q| &q.from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl TgUser {
    pub fn to_user(&self, last_seen: i64) -> User {
        User {
            id: self.id,
            first_name: self.first_name.clone(),
            is_bot: self.is_bot,
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            language_code: self.language_code.clone(),
            last_seen,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Origin of a forwarded message (Bot API 7.0+).
#[derive(Debug, Clone, Deserialize)]
pub struct MessageOrigin {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sender_user: Option<TgUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
    /// Pre-7.0 forward sender.
    #[serde(default)]
    pub forward_from: Option<TgUser>,
    #[serde(default)]
    pub forward_origin: Option<MessageOrigin>,
}

impl Message {
    /// Id of the user the message was forwarded from, if known.
    pub fn forwarded_from_id(&self) -> Option<i64> {
        if let Some(user) = &self.forward_from {
            return Some(user.id);
        }
        self.forward_origin
            .as_ref()
            .filter(|o| o.kind == "user")
            .and_then(|o| o.sender_user.as_ref())
            .map(|u| u.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: TgUser,
    #[serde(default)]
    pub query: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Outbound types
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_inline_query: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            switch_inline_query: None,
        }
    }

    pub fn inline_query(text: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            switch_inline_query: Some(query.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InputTextMessageContent {
    pub message_text: String,
    pub parse_mode: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_message_content: InputTextMessageContent,
}

impl InlineQueryResultArticle {
    pub fn html(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: "article",
            id: id.into(),
            title: title.into(),
            description: None,
            input_message_content: InputTextMessageContent {
                message_text: text.into(),
                parse_mode: "HTML",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Telegram {} request failed", method))?;

        let envelope: ApiResponse<T> = resp
            .json()
            .await
            .with_context(|| format!("Telegram {} returned invalid JSON", method))?;

        if !envelope.ok {
            bail!(
                "Telegram {} failed: {}",
                method,
                envelope.description.unwrap_or_else(|| "unknown error".into())
            );
        }
        match envelope.result {
            Some(result) => Ok(result),
            None => bail!("Telegram {} returned no result", method),
        }
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query", "inline_query"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<()> {
        let _: bool = self
            .call(
                "setWebhook",
                json!({
                    "url": url,
                    "secret_token": secret_token,
                    "allowed_updates": ["message", "callback_query", "inline_query"],
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self, drop_pending: bool) -> Result<()> {
        let _: bool = self
            .call(
                "deleteWebhook",
                json!({ "drop_pending_updates": drop_pending }),
            )
            .await?;
        Ok(())
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "link_preview_options": { "is_disabled": true },
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(kb)?;
        }
        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(kb)?;
        }
        let _: serde_json::Value = self.call("editMessageText", body).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, id: &str, text: Option<&str>) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn answer_inline_query(
        &self,
        id: &str,
        results: &[InlineQueryResultArticle],
    ) -> Result<()> {
        let _: bool = self
            .call(
                "answerInlineQuery",
                json!({ "inline_query_id": id, "results": results, "cache_time": 60 }),
            )
            .await?;
        Ok(())
    }
}
