//! A publisher that records posts instead of sending them.
//!
//! Backs `run --dry-run` and stands in for the social channel in tests.

use async_trait::async_trait;
use signalcast_core::error::ChannelError;
use signalcast_core::publisher::{PostReceipt, Publisher};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct RecordingPublisher {
    posts: Mutex<Vec<String>>,
    fail_next: Mutex<usize>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` publishes fail.
    pub async fn fail_next(&self, n: usize) {
        *self.fail_next.lock().await = n;
    }

    pub async fn posts(&self) -> Vec<String> {
        self.posts.lock().await.clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&self, content: &str) -> Result<PostReceipt, ChannelError> {
        {
            let mut remaining = self.fail_next.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChannelError::DeliveryFailed {
                    channel: "recording".into(),
                    reason: "scripted failure".into(),
                });
            }
        }

        let mut posts = self.posts.lock().await;
        posts.push(content.to_string());
        info!(n = posts.len(), preview = %content.chars().take(40).collect::<String>(), "Recorded post (dry run)");
        Ok(PostReceipt {
            post_id: Some(format!("dry-{}", posts.len())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let publisher = RecordingPublisher::new();
        publisher.publish("one").await.unwrap();
        let receipt = publisher.publish("two").await.unwrap();
        assert_eq!(receipt.post_id.as_deref(), Some("dry-2"));
        assert_eq!(publisher.posts().await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next(1).await;
        assert!(publisher.publish("lost").await.is_err());
        assert!(publisher.publish("kept").await.is_ok());
        assert_eq!(publisher.posts().await, vec!["kept"]);
    }
}
