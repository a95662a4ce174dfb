//! The admission decision function.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use crate::policy::AdmissionPolicy;
use crate::stats::AdmissionStatistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// Inside the overnight window. Caller applies its own long backoff.
    QuietHours,
    /// Today's cap is spent. Caller drops the item.
    DailyCapReached,
    /// Too many posts in the sliding window.
    BurstLimit,
    /// The previous post was too recent.
    TooSoon,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DenialReason::QuietHours => "quiet_hours",
            DenialReason::DailyCapReached => "daily_cap_reached",
            DenialReason::BurstLimit => "burst_limit",
            DenialReason::TooSoon => "too_soon",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allowed,
    Denied {
        reason: DenialReason,
        retry_after: Option<Duration>,
    },
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed)
    }

    fn deny(reason: DenialReason) -> Self {
        AdmissionDecision::Denied {
            reason,
            retry_after: None,
        }
    }

    /// Deny with a retry delay clamped to `0..=cap_seconds`.
    fn deny_for(reason: DenialReason, seconds: f64, cap_seconds: u64) -> Self {
        let cap = Duration::from_secs(cap_seconds);
        let delay = Duration::try_from_secs_f64(seconds.max(0.0)).map_or(cap, |d| d.min(cap));
        AdmissionDecision::Denied {
            reason,
            retry_after: Some(delay),
        }
    }
}

/// Unix seconds with sub-second precision.
pub(crate) fn unix_seconds(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}

/// Evaluate every admission check against `stats`, in order.
///
/// Mutates `stats` only to roll the day over and to evict timestamps that
/// left the sliding window. Recording an allowed post is the caller's job.
pub fn decide(
    now: DateTime<Utc>,
    stats: &mut AdmissionStatistics,
    policy: &AdmissionPolicy,
) -> AdmissionDecision {
    let local = now.with_timezone(&policy.timezone);
    stats.roll_over(local.date_naive());

    if policy.quiet_hours.contains(local.hour()) {
        return AdmissionDecision::deny(DenialReason::QuietHours);
    }

    if stats.posts_today >= policy.daily_limit {
        return AdmissionDecision::deny(DenialReason::DailyCapReached);
    }

    let now_secs = unix_seconds(now);
    stats.evict_older_than(now_secs, policy.window_seconds);
    if stats.recent_post_times.len() >= policy.max_per_window {
        let oldest = stats.oldest_recent().unwrap_or(now_secs);
        let retry = oldest + policy.window_seconds as f64 - now_secs;
        return AdmissionDecision::deny_for(DenialReason::BurstLimit, retry, policy.window_seconds);
    }

    if let Some(latest) = stats.latest_recent() {
        let elapsed = now_secs - latest;
        let min_interval = policy.min_interval_seconds as f64;
        if elapsed < min_interval {
            return AdmissionDecision::deny_for(
                DenialReason::TooSoon,
                min_interval - elapsed,
                policy.min_interval_seconds,
            );
        }
    }

    AdmissionDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::QuietHours;
    use chrono::TimeZone;

    /// 2026-10-14 at `hour`:00 Sydney time (AEDT, UTC+11).
    fn sydney(hour: u32) -> DateTime<Utc> {
        chrono_tz::Australia::Sydney
            .with_ymd_and_hms(2026, 10, 14, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn fresh_stats(now: DateTime<Utc>) -> AdmissionStatistics {
        AdmissionStatistics {
            day_key: Some(now.with_timezone(&chrono_tz::Australia::Sydney).date_naive()),
            ..Default::default()
        }
    }

    fn denial(decision: &AdmissionDecision) -> (DenialReason, Option<Duration>) {
        match decision {
            AdmissionDecision::Denied {
                reason,
                retry_after,
            } => (*reason, *retry_after),
            AdmissionDecision::Allowed => panic!("expected a denial"),
        }
    }

    #[test]
    fn open_slate_is_allowed() {
        let now = sydney(12);
        let mut stats = fresh_stats(now);
        assert!(decide(now, &mut stats, &AdmissionPolicy::default()).is_allowed());
    }

    #[test]
    fn quiet_hours_take_precedence_over_daily_cap() {
        let now = sydney(5);
        let mut stats = AdmissionStatistics {
            posts_today: 500,
            ..fresh_stats(now)
        };
        let decision = decide(now, &mut stats, &AdmissionPolicy::default());
        assert_eq!(denial(&decision), (DenialReason::QuietHours, None));
    }

    #[test]
    fn quiet_window_is_evaluated_in_reference_timezone() {
        // 05:00 UTC is 16:00 in Sydney.
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 5, 0, 0).unwrap();
        let mut stats = fresh_stats(now);
        assert!(decide(now, &mut stats, &AdmissionPolicy::default()).is_allowed());
    }

    #[test]
    fn daily_cap_is_a_terminal_denial() {
        let now = sydney(12);
        let policy = AdmissionPolicy::default();
        let mut stats = AdmissionStatistics {
            posts_today: policy.daily_limit,
            ..fresh_stats(now)
        };
        let decision = decide(now, &mut stats, &policy);
        assert_eq!(denial(&decision), (DenialReason::DailyCapReached, None));
    }

    #[test]
    fn rollover_resets_cap_before_checking() {
        let now = sydney(12);
        let policy = AdmissionPolicy::default();
        let mut stats = AdmissionStatistics {
            day_key: Some(chrono::NaiveDate::from_ymd_opt(2026, 10, 13).unwrap()),
            posts_today: policy.daily_limit,
            ..Default::default()
        };
        assert!(decide(now, &mut stats, &policy).is_allowed());
        assert_eq!(stats.posts_today, 0);
    }

    #[test]
    fn burst_limit_waits_for_oldest_entry_to_expire() {
        let now = sydney(12);
        let t = unix_seconds(now);
        let policy = AdmissionPolicy {
            max_per_window: 3,
            min_interval_seconds: 0,
            ..Default::default()
        };
        let mut stats = AdmissionStatistics {
            recent_post_times: vec![t - 1900.0, t - 1500.0, t - 900.0, t - 300.0],
            ..fresh_stats(now)
        };
        let (reason, retry) = denial(&decide(now, &mut stats, &policy));
        assert_eq!(reason, DenialReason::BurstLimit);
        assert_eq!(retry, Some(Duration::from_secs(300)));
        assert_eq!(stats.recent_post_times.len(), 3);
    }

    #[test]
    fn min_spacing_reports_remaining_interval() {
        let now = sydney(12);
        let t = unix_seconds(now);
        let mut stats = AdmissionStatistics {
            recent_post_times: vec![t - 1000.0, t - 100.0],
            ..fresh_stats(now)
        };
        let (reason, retry) = denial(&decide(now, &mut stats, &AdmissionPolicy::default()));
        assert_eq!(reason, DenialReason::TooSoon);
        assert_eq!(retry, Some(Duration::from_secs(500)));
    }

    #[test]
    fn spacing_satisfied_is_allowed() {
        let now = sydney(12);
        let t = unix_seconds(now);
        let mut stats = AdmissionStatistics {
            recent_post_times: vec![t - 600.0],
            ..fresh_stats(now)
        };
        assert!(decide(now, &mut stats, &AdmissionPolicy::default()).is_allowed());
    }

    #[test]
    fn disabled_quiet_window_allows_night_posts() {
        let now = sydney(5);
        let policy = AdmissionPolicy {
            quiet_hours: QuietHours { start: 0, end: 0 },
            ..Default::default()
        };
        let mut stats = fresh_stats(now);
        assert!(decide(now, &mut stats, &policy).is_allowed());
    }

    #[test]
    fn corrupt_timestamps_never_panic_or_stall() {
        let now = sydney(12);
        let t = unix_seconds(now);
        for bogus in [1e20, t * 1000.0, f64::INFINITY, f64::NAN] {
            let mut stats = AdmissionStatistics {
                recent_post_times: vec![bogus],
                ..fresh_stats(now)
            };
            assert!(decide(now, &mut stats, &AdmissionPolicy::default()).is_allowed());
            assert!(stats.recent_post_times.is_empty());
        }
    }

    #[test]
    fn retry_delay_is_bounded_by_its_policy_limit() {
        let nan = AdmissionDecision::deny_for(DenialReason::TooSoon, f64::NAN, 600);
        assert_eq!(denial(&nan).1, Some(Duration::ZERO));
        let huge = AdmissionDecision::deny_for(DenialReason::BurstLimit, 1e30, 1800);
        assert_eq!(denial(&huge).1, Some(Duration::from_secs(1800)));
        let negative = AdmissionDecision::deny_for(DenialReason::TooSoon, -5.0, 600);
        assert_eq!(denial(&negative).1, Some(Duration::ZERO));
    }
}
