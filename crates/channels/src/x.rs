//! X (Twitter) publisher over API v2.
//!
//! Posts are created with `POST /2/tweets` using an OAuth 2.0 user-context
//! bearer token that carries the `tweet.write` scope.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use signalcast_core::error::ChannelError;
use signalcast_core::publisher::{MAX_POST_CHARS, PostReceipt, Publisher};
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.x.com";

#[derive(Clone)]
pub struct XConfig {
    pub access_token: String,
    pub api_url: String,
}

impl XConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

impl std::fmt::Debug for XConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XConfig")
            .field("access_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

pub struct XPublisher {
    config: XConfig,
    client: reqwest::Client,
}

impl XPublisher {
    pub fn new(config: XConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    fn failure(reason: impl Into<String>) -> ChannelError {
        ChannelError::DeliveryFailed {
            channel: "x".into(),
            reason: reason.into(),
        }
    }
}

/// Reject content the API would refuse anyway.
fn check_length(content: &str) -> Result<(), ChannelError> {
    let chars = content.chars().count();
    if content.trim().is_empty() {
        return Err(ChannelError::InvalidPayload("empty post".into()));
    }
    if chars > MAX_POST_CHARS {
        return Err(ChannelError::InvalidPayload(format!(
            "post is {chars} characters, limit is {MAX_POST_CHARS}"
        )));
    }
    Ok(())
}

#[async_trait]
impl Publisher for XPublisher {
    fn name(&self) -> &str {
        "x"
    }

    async fn publish(&self, content: &str) -> Result<PostReceipt, ChannelError> {
        check_length(content)?;

        let response = self
            .client
            .post(self.url("/2/tweets"))
            .bearer_auth(&self.config.access_token)
            .json(&serde_json::json!({ "text": content }))
            .send()
            .await
            .map_err(|e| Self::failure(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {}
            401 | 403 => return Err(Self::failure(format!("{status} credentials rejected"))),
            429 => return Err(Self::failure("429 rate limited by platform")),
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, "X API returned error");
                return Err(Self::failure(format!("{status}: {body}")));
            }
        }

        let created: CreatedTweet = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("unreadable reply: {e}")))?;

        debug!(post_id = %created.data.id, "Post created");
        Ok(PostReceipt {
            post_id: Some(created.data.id),
        })
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        let response = self
            .client
            .get(self.url("/2/users/me"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    data: CreatedTweetData,
}

#[derive(Debug, Deserialize)]
struct CreatedTweetData {
    id: String,
}
