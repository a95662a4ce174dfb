//! Telegram channel adapter over the Bot API.
//!
//! `start` spawns a `getUpdates` long-poll loop that yields every new post
//! in the configured source chat. `send` delivers text with `sendMessage`,
//! or re-sends media by `file_id` with the text as caption.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use signalcast_core::channel::{Attachment, AttachmentKind, Channel, ChannelId, ChannelMessage};
use signalcast_core::error::ChannelError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram caps media captions at 1024 characters.
const MAX_CAPTION_CHARS: usize = 1024;

#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Source chat, as `@username` or numeric id.
    pub source_chat: String,
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    /// When false, `start` only opens the inject channel.
    pub polling: bool,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, source_chat: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            source_chat: source_chat.into(),
            api_url: DEFAULT_API_URL.into(),
            poll_timeout_secs: 30,
            polling: true,
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("source_chat", &self.source_chat)
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("polling", &self.polling)
            .finish()
    }
}

pub struct TelegramChannel {
    config: TelegramConfig,
    channel_id: ChannelId,
    client: reqwest::Client,
    /// Sender for injecting messages without the network.
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<ChannelMessage, ChannelError>>>>,
    poller: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()
            .unwrap_or_default();
        Self {
            config,
            channel_id: ChannelId("telegram".into()),
            client,
            inject_tx: tokio::sync::Mutex::new(None),
            poller: tokio::sync::Mutex::new(None),
        }
    }

    /// Inject a message as if it came from Telegram.
    pub async fn inject_message(&self, msg: ChannelMessage) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("Channel not started".into()))
        }
    }

    fn method_url(&self, method: &str) -> String {
        method_url(&self.config.api_url, &self.config.bot_token, method)
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        let reply: ApiReply<serde_json::Value> =
            response.json().await.map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: format!("unreadable reply: {e}"),
            })?;

        if reply.ok {
            Ok(())
        } else {
            Err(ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: reply.description.unwrap_or_else(|| format!("{method} failed")),
            })
        }
    }
}

fn method_url(api_url: &str, token: &str, method: &str) -> String {
    format!("{}/bot{token}/{method}", api_url.trim_end_matches('/'))
}

/// Whether `chat` is the configured source (`@name`, `name` or numeric id).
pub fn chat_matches(chat: &TgChat, source: &str) -> bool {
    let source = source.trim();
    if source.parse::<i64>().is_ok() {
        return chat.id.to_string() == source;
    }
    let wanted = source.trim_start_matches('@');
    chat.username
        .as_deref()
        .is_some_and(|u| u.eq_ignore_ascii_case(wanted))
}

/// Convert one update into a channel message if it is a post in `source`.
pub fn message_from_update(update: TgUpdate, source: &str) -> Option<ChannelMessage> {
    let post = update.channel_post.or(update.message)?;
    if !chat_matches(&post.chat, source) {
        return None;
    }

    let mut attachments = Vec::new();
    if let Some(photo) = post.photo.as_ref().and_then(|sizes| sizes.last()) {
        attachments.push(Attachment {
            kind: AttachmentKind::Image,
            file_ref: photo.file_id.clone(),
            mime_type: Some("image/jpeg".into()),
        });
    }
    for (kind, file) in [
        (AttachmentKind::Video, &post.video),
        (AttachmentKind::Animation, &post.animation),
        (AttachmentKind::Document, &post.document),
    ] {
        if let Some(file) = file {
            attachments.push(Attachment {
                kind,
                file_ref: file.file_id.clone(),
                mime_type: file.mime_type.clone(),
            });
        }
    }

    Some(ChannelMessage {
        channel_id: ChannelId("telegram".into()),
        chat_id: post.chat.id.to_string(),
        message_id: Some(post.message_id.to_string()),
        content: post.text.or(post.caption).unwrap_or_default(),
        attachments,
    })
}

/// Method and payload for re-sending `content` with an optional attachment.
fn send_request(chat_id: &str, content: &str, attachment: Option<&Attachment>) -> (&'static str, serde_json::Value) {
    let Some(attachment) = attachment else {
        return (
            "sendMessage",
            serde_json::json!({
                "chat_id": chat_id,
                "text": content,
                "disable_web_page_preview": true,
            }),
        );
    };

    let caption: String = content.chars().take(MAX_CAPTION_CHARS).collect();
    let (method, field) = match attachment.kind {
        AttachmentKind::Image => ("sendPhoto", "photo"),
        AttachmentKind::Video => ("sendVideo", "video"),
        AttachmentKind::Animation => ("sendAnimation", "animation"),
        AttachmentKind::Document | AttachmentKind::Other => ("sendDocument", "document"),
    };
    let mut body = serde_json::json!({ "chat_id": chat_id, "caption": caption });
    body[field] = serde_json::json!(attachment.file_ref);
    (method, body)
}

async fn poll_loop(
    client: reqwest::Client,
    config: TelegramConfig,
    tx: mpsc::Sender<Result<ChannelMessage, ChannelError>>,
) {
    let url = method_url(&config.api_url, &config.bot_token, "getUpdates");
    let mut offset: i64 = 0;

    loop {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": config.poll_timeout_secs,
            "allowed_updates": ["channel_post", "message"],
        });

        let reply = match client.post(&url).json(&body).send().await {
            Ok(response) => response.json::<ApiReply<Vec<TgUpdate>>>().await,
            Err(e) => Err(e),
        };

        let updates = match reply {
            Ok(ApiReply {
                ok: true,
                result: Some(updates),
                ..
            }) => updates,
            Ok(reply) => {
                warn!(description = ?reply.description, "getUpdates rejected");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(msg) = message_from_update(update, &config.source_chat) else {
                continue;
            };
            debug!(chat_id = %msg.chat_id, message_id = ?msg.message_id, "New source post");
            if tx.send(Ok(msg)).await.is_err() {
                debug!("Telegram receiver dropped, stopping poller");
                return;
            }
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        if self.config.polling && self.config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("telegram bot token".into()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx.clone());

        if self.config.polling {
            info!(source = %self.config.source_chat, "Telegram channel listening");
            let handle = tokio::spawn(poll_loop(self.client.clone(), self.config.clone(), tx));
            *self.poller.lock().await = Some(handle);
        } else {
            info!("Telegram channel started without polling");
        }
        Ok(rx)
    }

    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), ChannelError> {
        let (method, body) = send_request(chat_id, content, attachment);
        debug!(chat_id = %chat_id, method, chars = content.chars().count(), "Telegram send");
        self.call(method, body).await
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Telegram channel stopping");
        if let Some(handle) = self.poller.lock().await.take() {
            handle.abort();
        }
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Ok(false);
        }
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// --- Bot API types ---

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub channel_post: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<TgFile>>,
    #[serde(default)]
    pub video: Option<TgFile>,
    #[serde(default)]
    pub animation: Option<TgFile>,
    #[serde(default)]
    pub document: Option<TgFile>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgFile {
    pub file_id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}
