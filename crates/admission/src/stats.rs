//! Rolling usage statistics.
//!
//! Persisted layout (older field names are still read):
//!
//! ```json
//! {
//!   "day_key": "2026-10-14",
//!   "posts_today": 3,
//!   "recent_post_times": [1792000000.0, 1792000600.0],
//!   "last_interaction_time": null
//! }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionStatistics {
    /// Reference-timezone date of the last rollover.
    #[serde(default, alias = "today")]
    pub day_key: Option<NaiveDate>,

    #[serde(default, alias = "tweets_today")]
    pub posts_today: u32,

    /// Unix timestamps (seconds) of recent posts, oldest first.
    #[serde(default, alias = "recent_tweets")]
    pub recent_post_times: Vec<f64>,

    /// Advisory only; never consulted by admission.
    #[serde(default, alias = "last_interaction")]
    pub last_interaction_time: Option<f64>,
}

impl AdmissionStatistics {
    /// Reset the daily counter when `today` differs from `day_key`.
    /// Returns whether anything changed.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.day_key == Some(today) {
            return false;
        }
        self.day_key = Some(today);
        self.posts_today = 0;
        true
    }

    /// Drop timestamps at or beyond `window_seconds` before `now`, and any
    /// that lie after `now` (clock skew, or a file written in another unit).
    /// Returns how many were removed.
    pub fn evict_older_than(&mut self, now: f64, window_seconds: u64) -> usize {
        let horizon = now - window_seconds as f64;
        let before = self.recent_post_times.len();
        self.recent_post_times.retain(|&t| t > horizon && t <= now);
        before - self.recent_post_times.len()
    }

    pub fn oldest_recent(&self) -> Option<f64> {
        self.recent_post_times.iter().copied().reduce(f64::min)
    }

    pub fn latest_recent(&self) -> Option<f64> {
        self.recent_post_times.iter().copied().reduce(f64::max)
    }

    /// Count a successful dispatch at `now`.
    pub fn record_post(&mut self, now: f64) {
        self.recent_post_times.push(now);
        self.posts_today += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn eviction_keeps_entries_inside_window() {
        let t = 1_800_000_000.0;
        let mut stats = AdmissionStatistics {
            recent_post_times: vec![t - 1900.0, t - 1000.0, t - 100.0],
            ..Default::default()
        };
        assert_eq!(stats.evict_older_than(t, 1800), 1);
        assert_eq!(stats.recent_post_times, vec![t - 1000.0, t - 100.0]);
    }

    #[test]
    fn future_and_non_finite_timestamps_are_evicted() {
        let t = 1_800_000_000.0;
        let mut stats = AdmissionStatistics {
            recent_post_times: vec![t - 100.0, t, t * 1000.0, 1e20, f64::NAN],
            ..Default::default()
        };
        assert_eq!(stats.evict_older_than(t, 1800), 3);
        assert_eq!(stats.recent_post_times, vec![t - 100.0, t]);
    }

    #[test]
    fn rollover_is_idempotent_within_a_day() {
        let mut stats = AdmissionStatistics {
            day_key: Some(day(13)),
            posts_today: 7,
            ..Default::default()
        };
        assert!(stats.roll_over(day(14)));
        assert_eq!(stats.posts_today, 0);

        stats.record_post(1.0);
        assert!(!stats.roll_over(day(14)));
        assert_eq!(stats.posts_today, 1);
    }

    #[test]
    fn rollover_keeps_recent_times() {
        let mut stats = AdmissionStatistics {
            day_key: Some(day(13)),
            posts_today: 2,
            recent_post_times: vec![5.0],
            ..Default::default()
        };
        stats.roll_over(day(14));
        assert_eq!(stats.recent_post_times, vec![5.0]);
    }

    #[test]
    fn persisted_layout() {
        let stats = AdmissionStatistics {
            day_key: Some(day(14)),
            posts_today: 2,
            recent_post_times: vec![10.5],
            last_interaction_time: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["day_key"], "2026-10-14");
        assert_eq!(json["posts_today"], 2);
        assert_eq!(json["recent_post_times"][0], 10.5);
        assert!(json["last_interaction_time"].is_null());
    }

    #[test]
    fn reads_legacy_field_names() {
        let json = r#"{"today":"2026-10-14","tweets_today":4,"recent_tweets":[1.0,2.0],"last_interaction":3.0}"#;
        let stats: AdmissionStatistics = serde_json::from_str(json).unwrap();
        assert_eq!(stats.day_key, Some(day(14)));
        assert_eq!(stats.posts_today, 4);
        assert_eq!(stats.recent_post_times, vec![1.0, 2.0]);
        assert_eq!(stats.last_interaction_time, Some(3.0));
    }
}
