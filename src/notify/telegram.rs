//! Telegram Bot API transport.
//!
//! Only the three calls the watcher needs: `sendMessage`, `getUpdates`
//! (long polling) and `setMyCommands`. The token is part of every request
//! URL, so URLs are stripped from client errors before they are reported.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::notify::Transport;

const API_BASE: &str = "https://api.telegram.org";

/// Server-side wait of one `getUpdates` call.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Client timeout, longer than the long poll.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub update_id: i64,
    pub chat_id: String,
    /// Sender identity, used as the intake session key
    pub user_id: i64,
    pub text: String,
}

/// Entry of the bot's command menu.
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<User>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramBot {
    token: String,
    client: reqwest::Client,
    api_base: String,
}

// Keep the token out of debug output.
impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TelegramBot {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::config("Bot token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::transport(e.without_url().to_string()))?;

        Ok(Self {
            token,
            client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("{method}: {}", e.without_url())))?;

        let status = response.status();
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::transport(format!("{method}: {}", e.without_url())))?;

        if !parsed.ok {
            return Err(AppError::transport(format!(
                "{method} failed with {status}: {}",
                parsed.description.unwrap_or_default()
            )));
        }
        parsed
            .result
            .ok_or_else(|| AppError::transport(format!("{method}: missing result")))
    }

    /// Long-poll for messages with `update_id >= offset`.
    ///
    /// Updates without text are skipped but still advance the offset
    /// through the returned maximum id.
    pub async fn get_updates(&self, offset: i64) -> Result<(Vec<IncomingMessage>, Option<i64>)> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": LONG_POLL_TIMEOUT.as_secs(),
                    "allowed_updates": ["message"],
                }),
            )
            .await?;

        let last_id = updates.iter().map(|u| u.update_id).max();
        Ok((into_messages(updates), last_id))
    }

    /// Register the command menu shown by chat clients.
    pub async fn set_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramBot {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "MarkdownV2",
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(())
    }
}

fn into_messages(updates: Vec<Update>) -> Vec<IncomingMessage> {
    updates
        .into_iter()
        .filter_map(|update| {
            let message = update.message?;
            let text = message.text?;
            let user_id = message.from.map(|u| u.id).unwrap_or(message.chat.id);
            Some(IncomingMessage {
                update_id: update.update_id,
                chat_id: message.chat.id.to_string(),
                user_id,
                text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let bot = TelegramBot::new("123456:very-secret").unwrap();
        let out = format!("{bot:?}");
        assert!(!out.contains("very-secret"));
        assert!(out.contains("<REDACTED>"));
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(TelegramBot::new("  ").is_err_and(|e| e.is_config()));
    }

    #[test]
    fn test_method_url() {
        let bot = TelegramBot::new("T").unwrap().with_api_base("http://localhost:8081/");
        assert_eq!(bot.method_url("getMe"), "http://localhost:8081/botT/getMe");
    }

    #[test]
    fn test_updates_into_messages() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -5}, "from": {"id": 7}, "text": "/add"}},
                {"update_id": 11, "message": {"message_id": 2, "chat": {"id": -5}, "from": {"id": 7}}},
                {"update_id": 12, "edited_message": {"message_id": 1, "chat": {"id": -5}, "text": "x"}},
                {"update_id": 13, "message": {"message_id": 3, "chat": {"id": 9}, "text": "hi"}}
            ]
        }"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.ok);

        let messages = into_messages(parsed.result.unwrap());
        assert_eq!(
            messages,
            vec![
                IncomingMessage {
                    update_id: 10,
                    chat_id: "-5".into(),
                    user_id: 7,
                    text: "/add".into(),
                },
                IncomingMessage {
                    update_id: 13,
                    chat_id: "9".into(),
                    user_id: 9,
                    text: "hi".into(),
                },
            ]
        );
    }

    #[test]
    fn test_error_response_shape() {
        let raw = r#"{"ok": false, "error_code": 400, "description": "Bad Request: can't parse entities"}"#;
        let parsed: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert!(parsed.result.is_none());
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: can't parse entities")
        );
    }
}
