//! Admission controller: the decision function bound to owned statistics,
//! a store and a clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use signalcast_core::{Clock, StorageError};
use tracing::{debug, info, warn};

use crate::decision::{AdmissionDecision, decide, unix_seconds};
use crate::policy::AdmissionPolicy;
use crate::stats::AdmissionStatistics;
use crate::store::StatsStore;

/// Owns the process statistics. Only the posting worker should hold one.
pub struct AdmissionController {
    policy: AdmissionPolicy,
    stats: AdmissionStatistics,
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Load statistics from `store`. Unreadable statistics start fresh.
    pub fn open(policy: AdmissionPolicy, store: Arc<dyn StatsStore>, clock: Arc<dyn Clock>) -> Self {
        let stats = match store.load() {
            Ok(stats) => stats,
            Err(e) => {
                warn!(store = %store.name(), error = %e, "Could not load statistics, starting fresh");
                AdmissionStatistics::default()
            }
        };
        info!(
            store = %store.name(),
            posts_today = stats.posts_today,
            recent = stats.recent_post_times.len(),
            "Admission statistics loaded"
        );
        Self {
            policy,
            stats,
            store,
            clock,
        }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &AdmissionStatistics {
        &self.stats
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Posts still allowed today under the cap.
    pub fn remaining_today(&self) -> u32 {
        self.policy.daily_limit.saturating_sub(self.stats.posts_today)
    }

    /// Decide for the current instant. Rollover and eviction are persisted.
    pub fn decide(&mut self) -> AdmissionDecision {
        let now = self.clock.now();
        let before = self.stats.clone();
        let decision = decide(now, &mut self.stats, &self.policy);

        if self.stats != before {
            if let Err(e) = self.persist() {
                warn!(error = %e, "Failed to persist statistics after admission check");
            }
        }

        debug!(?decision, posts_today = self.stats.posts_today, "Admission decided");
        decision
    }

    /// Count a successful dispatch at the current instant.
    pub fn record_post(&mut self) -> Result<(), StorageError> {
        let now = self.clock.now();
        self.stats
            .roll_over(now.with_timezone(&self.policy.timezone).date_naive());
        self.stats.record_post(unix_seconds(now));
        self.persist()
    }

    /// Note a non-posting engagement. Advisory only.
    pub fn record_interaction(&mut self) -> Result<(), StorageError> {
        self.stats.last_interaction_time = Some(unix_seconds(self.clock.now()));
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.store.save(&self.stats)
    }
}
