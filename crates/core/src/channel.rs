//! Channel trait — the abstraction over chat platforms.
//!
//! A Channel connects the relay to a messaging platform (Telegram). It
//! delivers new messages posted in the source chat and sends the cleaned
//! copy to the broadcast chat.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received from or sent to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this message belongs to
    pub channel_id: ChannelId,

    /// The chat/channel identifier within the platform
    pub chat_id: String,

    /// Platform message ID (if known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// The text content (caption for media messages)
    pub content: String,

    /// Attachments (images, files, video, etc.)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ChannelMessage {
    /// A plain text message in the given chat.
    pub fn text(channel_id: &str, chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: ChannelId(channel_id.into()),
            chat_id: chat_id.into(),
            message_id: None,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// An attachment in a channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Type of attachment
    pub kind: AttachmentKind,

    /// Platform file reference (Telegram `file_id`) or URL
    pub file_ref: String,

    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
    Video,
    Animation,
    Other,
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic and message
/// formatting.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Unique ID for this channel instance.
    fn id(&self) -> &ChannelId;

    /// Start listening for incoming messages from the configured source.
    ///
    /// Returns a receiver that yields incoming messages. The channel
    /// implementation handles polling internally.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a message to a chat, re-attaching media when given.
    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        attachment: Option<&Attachment>,
    ) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check — is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
