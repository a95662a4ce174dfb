//! The single posting consumer.
//!
//! Per-item policy:
//!
//! | decision          | action                                        |
//! |-------------------|-----------------------------------------------|
//! | Allowed           | publish; record on success, drop on failure   |
//! | QuietHours        | sleep the fixed backoff, re-enqueue at tail   |
//! | BurstLimit        | sleep retry delay + jitter, re-enqueue        |
//! | TooSoon           | sleep retry delay + jitter, re-enqueue        |
//! | DailyCapReached   | drop                                          |
//!
//! Failed publishes are never retried: whether the post went out is unknown.

use std::sync::Arc;
use std::time::Duration;

use signalcast_admission::{AdmissionController, AdmissionDecision, DenialReason};
use signalcast_config::WorkerSettings;
use signalcast_core::{Error, Publisher, RandomSource};
use tracing::{error, info, warn};

use crate::queue::{PostQueue, QueueItem};

#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    pub quiet_hours_backoff: Duration,
    /// Inclusive bounds, in seconds.
    pub retry_jitter: (u64, u64),
    pub pause: (u64, u64),
    pub error_backoff: Duration,
}

impl WorkerPolicy {
    pub fn from_settings(settings: &WorkerSettings) -> Self {
        Self {
            quiet_hours_backoff: Duration::from_secs(settings.quiet_hours_backoff_seconds),
            retry_jitter: (settings.retry_jitter_min_seconds, settings.retry_jitter_max_seconds),
            pause: (settings.pause_min_seconds, settings.pause_max_seconds),
            error_backoff: Duration::from_secs(settings.error_backoff_seconds),
        }
    }
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self::from_settings(&WorkerSettings::default())
    }
}

/// What happened to one dequeued item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Published { post_id: Option<String> },
    /// Publisher failed; the item is gone.
    PublishFailed,
    /// Daily cap; the item is gone.
    Dropped,
    /// Slept and went back to the tail.
    Deferred { reason: DenialReason, waited: Duration },
}

pub struct PostingWorker {
    queue: Arc<PostQueue>,
    controller: AdmissionController,
    publisher: Arc<dyn Publisher>,
    policy: WorkerPolicy,
    rng: Box<dyn RandomSource>,
}

impl PostingWorker {
    pub fn new(
        queue: Arc<PostQueue>,
        controller: AdmissionController,
        publisher: Arc<dyn Publisher>,
        policy: WorkerPolicy,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            queue,
            controller,
            publisher,
            policy,
            rng,
        }
    }

    pub fn controller(&self) -> &AdmissionController {
        &self.controller
    }

    /// Drain the queue forever. Errors are isolated to their item.
    pub async fn run(mut self) {
        info!(publisher = %self.publisher.name(), "Posting worker started");
        loop {
            let item = self.queue.pop().await;
            if let Err(e) = self.process(item).await {
                error!(error = %e, backoff = ?self.policy.error_backoff, "Posting worker error");
                tokio::time::sleep(self.policy.error_backoff).await;
            }
        }
    }

    /// Process the next queued item, if there is one.
    pub async fn process_next(&mut self) -> Option<Result<ProcessOutcome, Error>> {
        let item = self.queue.try_pop()?;
        Some(self.process(item).await)
    }

    /// Run one item through admission and, if allowed, the publisher.
    pub async fn process(&mut self, item: QueueItem) -> Result<ProcessOutcome, Error> {
        match self.controller.decide() {
            AdmissionDecision::Allowed => self.dispatch(item).await,
            AdmissionDecision::Denied {
                reason: DenialReason::DailyCapReached,
                ..
            } => {
                warn!(
                    item = %item.label,
                    limit = self.controller.policy().daily_limit,
                    "Daily limit reached, dropping post"
                );
                Ok(ProcessOutcome::Dropped)
            }
            AdmissionDecision::Denied {
                reason,
                retry_after,
            } => {
                let waited = self.backoff_for(reason, retry_after);
                info!(
                    item = %item.label,
                    reason = %reason,
                    wait_secs = waited.as_secs(),
                    queued = self.queue.len(),
                    "Post deferred"
                );
                tokio::time::sleep(waited).await;
                self.queue.requeue(item);
                Ok(ProcessOutcome::Deferred { reason, waited })
            }
        }
    }

    fn backoff_for(&mut self, reason: DenialReason, retry_after: Option<Duration>) -> Duration {
        match reason {
            DenialReason::QuietHours => self.policy.quiet_hours_backoff,
            _ => {
                let (low, high) = self.policy.retry_jitter;
                let jitter = Duration::from_secs(self.rng.between(low, high));
                retry_after.unwrap_or_default() + jitter
            }
        }
    }

    async fn dispatch(&mut self, item: QueueItem) -> Result<ProcessOutcome, Error> {
        match self.publisher.publish(&item.text).await {
            Ok(receipt) => {
                self.controller.record_post()?;
                let stats = self.controller.stats();
                info!(
                    item = %item.label,
                    post_id = ?receipt.post_id,
                    today = stats.posts_today,
                    limit = self.controller.policy().daily_limit,
                    "Post published"
                );
                let (low, high) = self.policy.pause;
                tokio::time::sleep(Duration::from_secs(self.rng.between(low, high))).await;
                Ok(ProcessOutcome::Published {
                    post_id: receipt.post_id,
                })
            }
            Err(e) => {
                let preview: String = item.text.chars().take(40).collect();
                warn!(item = %item.label, error = %e, preview = %preview, "Publish failed, dropping post");
                Ok(ProcessOutcome::PublishFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use signalcast_admission::{AdmissionPolicy, AdmissionStatistics, InMemoryStore, StatsStore};
    use signalcast_core::{ChannelError, Clock, PostReceipt, StdRandom};
    use tokio::sync::Mutex;

    /// Wall clock that follows tokio's (pausable) clock.
    struct TokioClock {
        base: DateTime<Utc>,
        start: tokio::time::Instant,
    }

    impl TokioClock {
        fn starting_at(base: DateTime<Utc>) -> Self {
            Self {
                base,
                start: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.start.elapsed()).unwrap_or_default();
            self.base + elapsed
        }
    }

    #[derive(Default)]
    struct ScriptedPublisher {
        posts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Publisher for ScriptedPublisher {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn publish(&self, content: &str) -> Result<PostReceipt, ChannelError> {
            if self.fail {
                return Err(ChannelError::DeliveryFailed {
                    channel: "scripted".into(),
                    reason: "boom".into(),
                });
            }
            let mut posts = self.posts.lock().await;
            posts.push(content.to_string());
            Ok(PostReceipt {
                post_id: Some(posts.len().to_string()),
            })
        }
    }

    fn sydney(hour: u32) -> DateTime<Utc> {
        chrono_tz::Australia::Sydney
            .with_ymd_and_hms(2026, 10, 14, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    struct Harness {
        queue: Arc<PostQueue>,
        store: Arc<InMemoryStore>,
        publisher: Arc<ScriptedPublisher>,
        worker: PostingWorker,
    }

    fn harness(start: DateTime<Utc>, stats: AdmissionStatistics, publisher: ScriptedPublisher) -> Harness {
        let queue = Arc::new(PostQueue::new());
        let store = Arc::new(InMemoryStore::with_record(stats));
        let publisher = Arc::new(publisher);
        let controller = AdmissionController::open(
            AdmissionPolicy::default(),
            store.clone(),
            Arc::new(TokioClock::starting_at(start)),
        );
        let worker = PostingWorker::new(
            queue.clone(),
            controller,
            publisher.clone(),
            WorkerPolicy::default(),
            Box::new(StdRandom::seeded(9)),
        );
        Harness {
            queue,
            store,
            publisher,
            worker,
        }
    }

    fn item(text: &str) -> QueueItem {
        QueueItem::new(text, "$KERNEL AL9ECCZr…", Utc::now())
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_and_records() {
        let mut h = harness(sydney(12), AdmissionStatistics::default(), ScriptedPublisher::default());
        h.queue.push(item("post one"));

        let outcome = h.worker.process_next().await.unwrap().unwrap();
        assert_eq!(
            outcome,
            ProcessOutcome::Published {
                post_id: Some("1".into())
            }
        );
        assert_eq!(h.publisher.posts.lock().await.clone(), vec!["post one"]);
        assert_eq!(h.store.snapshot().unwrap().posts_today, 1);
        assert!(h.queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn second_post_is_deferred_then_published() {
        let mut h = harness(sydney(12), AdmissionStatistics::default(), ScriptedPublisher::default());
        h.queue.push(item("a"));
        h.queue.push(item("b"));

        h.worker.process_next().await.unwrap().unwrap();
        let outcome = h.worker.process_next().await.unwrap().unwrap();
        match outcome {
            ProcessOutcome::Deferred { reason, waited } => {
                assert_eq!(reason, DenialReason::TooSoon);
                // 600s spacing minus the 5-15s pause, plus 10-30s jitter.
                assert!(waited >= Duration::from_secs(595));
                assert!(waited <= Duration::from_secs(625));
            }
            other => panic!("expected deferral, got {other:?}"),
        }
        assert_eq!(h.queue.len(), 1);

        let outcome = h.worker.process_next().await.unwrap().unwrap();
        assert!(matches!(outcome, ProcessOutcome::Published { .. }));
        assert_eq!(h.publisher.posts.lock().await.clone(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_cap_drops_without_requeue() {
        let stats = AdmissionStatistics {
            day_key: Some(sydney(12).with_timezone(&chrono_tz::Australia::Sydney).date_naive()),
            posts_today: 50,
            ..Default::default()
        };
        let mut h = harness(sydney(12), stats, ScriptedPublisher::default());
        h.queue.push(item("capped"));
        let before = h.queue.len();

        let outcome = h.worker.process_next().await.unwrap().unwrap();
        assert_eq!(outcome, ProcessOutcome::Dropped);
        assert!(h.queue.len() < before);
        assert!(h.publisher.posts.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_hours_sleep_fixed_backoff_and_requeue() {
        let mut h = harness(sydney(4), AdmissionStatistics::default(), ScriptedPublisher::default());
        h.queue.push(item("night"));
        let started = tokio::time::Instant::now();

        let outcome = h.worker.process_next().await.unwrap().unwrap();
        assert_eq!(
            outcome,
            ProcessOutcome::Deferred {
                reason: DenialReason::QuietHours,
                waited: Duration::from_secs(1800)
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(1800));
        assert_eq!(h.queue.try_pop().unwrap().deferrals, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_failure_drops_and_does_not_count() {
        let failing = ScriptedPublisher {
            fail: true,
            ..Default::default()
        };
        let mut h = harness(sydney(12), AdmissionStatistics::default(), failing);
        h.queue.push(item("lost"));

        let outcome = h.worker.process_next().await.unwrap().unwrap();
        assert_eq!(outcome, ProcessOutcome::PublishFailed);
        assert!(h.queue.is_empty());
        assert_eq!(h.store.load().unwrap().posts_today, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_yields_nothing() {
        let mut h = harness(sydney(12), AdmissionStatistics::default(), ScriptedPublisher::default());
        assert!(h.worker.process_next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_drains_queue_with_tail_requeue() {
        let h = harness(sydney(12), AdmissionStatistics::default(), ScriptedPublisher::default());
        for text in ["x1", "x2", "x3"] {
            h.queue.push(item(text));
        }
        let publisher = h.publisher.clone();
        let task = tokio::spawn(h.worker.run());

        tokio::time::sleep(Duration::from_secs(3 * 700)).await;
        task.abort();
        // x2 is deferred behind x3 and overtaken once it comes back.
        assert_eq!(publisher.posts.lock().await.clone(), vec!["x1", "x3", "x2"]);
    }

    struct ReadOnlyStore;

    impl StatsStore for ReadOnlyStore {
        fn name(&self) -> &str {
            "read-only"
        }

        fn load(&self) -> Result<AdmissionStatistics, signalcast_core::StorageError> {
            Ok(AdmissionStatistics::default())
        }

        fn save(&self, _stats: &AdmissionStatistics) -> Result<(), signalcast_core::StorageError> {
            Err(signalcast_core::StorageError::Io {
                path: "stats.json".into(),
                reason: "read-only file system".into(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failure_does_not_stop_the_loop() {
        let queue = Arc::new(PostQueue::new());
        let publisher = Arc::new(ScriptedPublisher::default());
        let controller = AdmissionController::open(
            AdmissionPolicy::default(),
            Arc::new(ReadOnlyStore),
            Arc::new(TokioClock::starting_at(sydney(12))),
        );
        let worker = PostingWorker::new(
            queue.clone(),
            controller,
            publisher.clone(),
            WorkerPolicy::default(),
            Box::new(StdRandom::seeded(4)),
        );
        queue.push(item("x1"));
        queue.push(item("x2"));
        let task = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_secs(700)).await;
        task.abort();
        // The in-memory count still spaces the second post.
        assert_eq!(publisher.posts.lock().await.clone(), vec!["x1", "x2"]);
    }
}
