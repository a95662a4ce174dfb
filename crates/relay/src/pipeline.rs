//! The producer path: one inbound message in, a broadcast copy and at
//! most one queued post out.

use std::sync::Arc;

use signalcast_content::{BodySource, Composer, clean_for_broadcast};
use signalcast_core::{Channel, ChannelError, ChannelMessage, Clock, RandomSource};
use signalcast_extract::extract;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::queue::{PostQueue, QueueItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Blank text (media-only posts included); nothing was sent or queued.
    Ignored,
    /// Forwarded only. Social posting is off or no address was found.
    BroadcastOnly { broadcast_ok: bool },
    Enqueued { broadcast_ok: bool, source: BodySource },
    /// The finished post failed the integrity check and was not queued.
    Rejected { broadcast_ok: bool },
}

pub struct SignalPipeline {
    channel: Arc<dyn Channel>,
    dest_chat: String,
    footer: String,
    composer: Composer,
    /// `None` when the social path is disabled.
    queue: Option<Arc<PostQueue>>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RandomSource>,
}

impl SignalPipeline {
    pub fn new(
        channel: Arc<dyn Channel>,
        dest_chat: impl Into<String>,
        footer: impl Into<String>,
        composer: Composer,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            channel,
            dest_chat: dest_chat.into(),
            footer: footer.into(),
            composer,
            queue: None,
            clock,
            rng,
        }
    }

    /// Enable the social path, feeding `queue`.
    pub fn with_queue(mut self, queue: Arc<PostQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Consume inbound messages until the channel closes.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Result<ChannelMessage, ChannelError>>) {
        info!(
            dest = %self.dest_chat,
            social = self.queue.is_some(),
            "Signal pipeline started"
        );
        while let Some(msg) = inbound.recv().await {
            match msg {
                Ok(msg) => {
                    self.handle(msg).await;
                }
                Err(e) => warn!(error = %e, "Inbound channel error"),
            }
        }
        info!("Inbound channel closed, pipeline stopping");
    }

    pub async fn handle(&mut self, msg: ChannelMessage) -> PipelineOutcome {
        if msg.content.trim().is_empty() {
            return PipelineOutcome::Ignored;
        }

        let broadcast_ok = self.broadcast(&msg).await;

        let Some(queue) = self.queue.clone() else {
            return PipelineOutcome::BroadcastOnly { broadcast_ok };
        };

        let record = extract(&msg.content);
        if !record.is_postable() {
            debug!(token = ?record.token_name, "No contract address, broadcast only");
            return PipelineOutcome::BroadcastOnly { broadcast_ok };
        }

        let label = format!(
            "{} {}",
            record.token_name.as_deref().unwrap_or("-"),
            record.ca_fragment()
        );
        info!(
            token = ?record.token_name,
            ca = %record.ca_fragment(),
            chain = %record.chain,
            gain = ?record.gain,
            "Signal extracted"
        );

        let post = match self.composer.compose(&record, self.rng.as_mut()).await {
            Ok(post) => post,
            Err(report) => {
                warn!(
                    item = %label,
                    violations = %report.summary(),
                    "Post not queued"
                );
                return PipelineOutcome::Rejected { broadcast_ok };
            }
        };
        queue.push(QueueItem::new(post.text, label, self.clock.now()));
        info!(source = ?post.source, queued = queue.len(), "Post enqueued");

        PipelineOutcome::Enqueued {
            broadcast_ok,
            source: post.source,
        }
    }

    async fn broadcast(&self, msg: &ChannelMessage) -> bool {
        let cleaned = clean_for_broadcast(&msg.content, &self.footer);
        match self
            .channel
            .send(&self.dest_chat, &cleaned, msg.attachments.first())
            .await
        {
            Ok(()) => {
                debug!(dest = %self.dest_chat, "Broadcast copy sent");
                true
            }
            Err(e) => {
                warn!(dest = %self.dest_chat, error = %e, "Broadcast failed");
                false
            }
        }
    }
}
