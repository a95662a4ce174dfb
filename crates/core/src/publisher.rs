//! Publisher trait — the social-channel dispatch collaborator.
//!
//! A publisher takes a finished post (at most 280 characters) and performs
//! the network action. It reports success or an opaque failure; callers
//! never retry a failed publish because its side effects are unknown.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// Maximum post length accepted by the social channel, in characters.
pub const MAX_POST_CHARS: usize = 280;

/// Confirmation returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// Platform-assigned post ID (if the platform returns one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Human-readable publisher name (e.g., "x").
    fn name(&self) -> &str;

    /// Publish a finished post.
    async fn publish(&self, content: &str) -> std::result::Result<PostReceipt, ChannelError>;

    /// Health check — are the credentials accepted?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
