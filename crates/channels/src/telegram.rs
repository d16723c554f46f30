//! Telegram channel adapter over the Bot API.
//!
//! Long polling via `getUpdates`; outbound via `sendMessage`,
//! `sendDocument` (multipart), `sendChatAction`, and `setMyCommands` for
//! the slash-command menu. No webhook mode.

use async_trait::async_trait;
use mordomo_core::channel::{Channel, ChatId, IncomingMessage, PresenceAction};
use mordomo_core::error::ChannelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait, in seconds. The HTTP client timeout leaves headroom
/// above this.
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_RETRY_DELAY_SECS: u64 = 5;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Allowed user IDs. Empty = deny all, ["*"] = allow all.
    pub allowed_users: Vec<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

/// One entry of the bot command menu (`setMyCommands`).
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Telegram channel adapter.
#[derive(Debug)]
pub struct TelegramChannel {
    config: TelegramConfig,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self, ChannelError> {
        if config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("empty bot token".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 30))
            .build()
            .map_err(|e| ChannelError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            base_url: TELEGRAM_API_BASE.into(),
            client,
        })
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.config.bot_token, method)
    }

    /// Register the slash-command menu shown in the Telegram client.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.api_url("setMyCommands"))
            .json(&serde_json::json!({ "commands": commands }))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(format!("setMyCommands: {e}")))?;

        Self::check_api_response(response).await?;
        info!(count = commands.len(), "Bot command menu registered");
        Ok(())
    }

    /// Decode `{ok, description}` and turn a Bot API refusal into an error.
    async fn check_api_response(response: reqwest::Response) -> Result<(), ChannelError> {
        let status = response.status();
        let body: ApiResult = response
            .json()
            .await
            .map_err(|e| ChannelError::InvalidPayload(format!("Bot API response: {e}")))?;

        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("status {}", status.as_u16()));
            return Err(ChannelError::ConnectionLost(format!(
                "Bot API refused: {description}"
            )));
        }
        Ok(())
    }

    async fn poll_once(
        client: &reqwest::Client,
        url: &str,
        offset: i64,
    ) -> Result<Vec<ApiUpdate>, ChannelError> {
        let response = client
            .post(url)
            .json(&serde_json::json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(format!("getUpdates: {e}")))?;

        let body: ApiUpdatesResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::InvalidPayload(format!("getUpdates response: {e}")))?;

        if !body.ok {
            return Err(ChannelError::ConnectionLost(
                body.description
                    .unwrap_or_else(|| "getUpdates refused".into()),
            ));
        }
        Ok(body.result)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<IncomingMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let url = self.api_url("getUpdates");

        info!("Telegram long polling started");

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            loop {
                let updates = match Self::poll_once(&client, &url, offset).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!(error = %e, "getUpdates failed, retrying");
                        tokio::time::sleep(Duration::from_secs(POLL_RETRY_DELAY_SECS)).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = offset.max(update.update_id + 1);

                    let Some(message) = update.message else {
                        continue;
                    };
                    // Stickers, photos, etc. carry no text and are ignored.
                    let Some(text) = message.text else {
                        continue;
                    };

                    let incoming = IncomingMessage {
                        chat_id: ChatId(message.chat.id),
                        sender_id: message
                            .from
                            .as_ref()
                            .map(|u| u.id.to_string())
                            .unwrap_or_default(),
                        sender_name: message.from.and_then(|u| u.first_name),
                        text,
                    };

                    debug!(chat_id = %incoming.chat_id, "Update received");

                    if tx.send(Ok(incoming)).await.is_err() {
                        info!("Update receiver dropped, stopping long poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": chat_id.0,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: format!("sendMessage: {e}"),
            })?;

        Self::check_api_response(response)
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: e.to_string(),
            })
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: format!("reading {}: {e}", path.display()),
            })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("documento")
            .to_string();

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.0.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: format!("sendDocument: {e}"),
            })?;

        Self::check_api_response(response)
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: e.to_string(),
            })
    }

    async fn send_presence(
        &self,
        chat_id: ChatId,
        action: PresenceAction,
    ) -> Result<(), ChannelError> {
        let action = match action {
            PresenceAction::Typing => "typing",
            PresenceAction::UploadingDocument => "upload_document",
        };

        let response = self
            .client
            .post(self.api_url("sendChatAction"))
            .json(&serde_json::json!({
                "chat_id": chat_id.0,
                "action": action,
            }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: format!("sendChatAction: {e}"),
            })?;

        Self::check_api_response(response)
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                chat_id: chat_id.0,
                reason: e.to_string(),
            })
    }

    fn is_allowed(&self, sender_id: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return false;
        }
        if self.config.allowed_users.iter().any(|u| u == "*") {
            return true;
        }
        self.config.allowed_users.iter().any(|u| u == sender_id)
    }
}

// --- Bot API wire types ---

#[derive(Debug, Deserialize)]
struct ApiResult {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUpdatesResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Vec<ApiUpdate>,
}

#[derive(Debug, Deserialize)]
struct ApiUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    chat: ApiChat,
    #[serde(default)]
    from: Option<ApiUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: i64,
    #[serde(default)]
    first_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:test-token".into(),
            allowed_users: vec!["*".into()],
        }
    }

    #[test]
    fn config_debug_redacts_token() {
        let debug = format!("{:?}", test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = TelegramChannel::new(TelegramConfig {
            bot_token: String::new(),
            allowed_users: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, ChannelError::NotConfigured(_)));
    }

    #[test]
    fn api_url_embeds_token_and_method() {
        let ch = TelegramChannel::new(test_config()).unwrap();
        assert_eq!(
            ch.api_url("sendMessage"),
            "https://api.telegram.org/bot123:test-token/sendMessage"
        );
    }

    #[test]
    fn allowlist_wildcard() {
        let ch = TelegramChannel::new(test_config()).unwrap();
        assert!(ch.is_allowed("anyone"));
    }

    #[test]
    fn allowlist_specific() {
        let ch = TelegramChannel::new(TelegramConfig {
            bot_token: "tok".into(),
            allowed_users: vec!["111".into(), "222".into()],
        })
        .unwrap();
        assert!(ch.is_allowed("111"));
        assert!(ch.is_allowed("222"));
        assert!(!ch.is_allowed("333"));
    }

    #[test]
    fn allowlist_empty_denies() {
        let ch = TelegramChannel::new(TelegramConfig {
            bot_token: "tok".into(),
            allowed_users: vec![],
        })
        .unwrap();
        assert!(!ch.is_allowed("anyone"));
    }

    #[test]
    fn update_parsing() {
        let payload = r#"{
            "ok": true,
            "result": [{
                "update_id": 1001,
                "message": {
                    "message_id": 5,
                    "chat": {"id": -42, "type": "private"},
                    "from": {"id": 777, "is_bot": false, "first_name": "Alice"},
                    "text": "Boa noite"
                }
            }]
        }"#;
        let body: ApiUpdatesResponse = serde_json::from_str(payload).unwrap();
        assert!(body.ok);
        assert_eq!(body.result.len(), 1);

        let message = body.result[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, -42);
        assert_eq!(message.from.as_ref().unwrap().id, 777);
        assert_eq!(message.text.as_deref(), Some("Boa noite"));
    }

    #[test]
    fn textless_update_parses_with_no_text() {
        // A sticker update carries no "text" field.
        let payload = r#"{
            "ok": true,
            "result": [{
                "update_id": 1002,
                "message": {
                    "message_id": 6,
                    "chat": {"id": 1, "type": "private"},
                    "sticker": {"file_id": "abc"}
                }
            }]
        }"#;
        let body: ApiUpdatesResponse = serde_json::from_str(payload).unwrap();
        assert!(body.result[0].message.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn refusal_parsing() {
        let payload = r#"{"ok": false, "description": "Unauthorized"}"#;
        let body: ApiResult = serde_json::from_str(payload).unwrap();
        assert!(!body.ok);
        assert_eq!(body.description.as_deref(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_delivery_error() {
        let ch = TelegramChannel::new(test_config())
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = ch.send_text(ChatId(1), "oi").await.unwrap_err();
        assert!(matches!(err, ChannelError::DeliveryFailed { chat_id: 1, .. }));
    }

    #[test]
    fn bot_command_serialization() {
        let cmd = BotCommand {
            command: "pdf".into(),
            description: "Gera um documento PDF".into(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "pdf");
    }
}
