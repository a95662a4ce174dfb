//! Admission limits resolved from configuration.

use chrono_tz::Tz;
use signalcast_config::{AdmissionSettings, ConfigError, WINDOW_SECONDS};

/// An hour-of-day window in the reference timezone.
///
/// `start < end` covers `start..end`; `start > end` wraps past midnight;
/// `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start: u32,
    pub end: u32,
}

impl QuietHours {
    pub fn contains(&self, hour: u32) -> bool {
        match self.start.cmp(&self.end) {
            std::cmp::Ordering::Less => hour >= self.start && hour < self.end,
            std::cmp::Ordering::Greater => hour >= self.start || hour < self.end,
            std::cmp::Ordering::Equal => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub min_interval_seconds: u64,
    pub max_per_window: usize,
    pub window_seconds: u64,
    /// Already resolved for new-account mode.
    pub daily_limit: u32,
    pub quiet_hours: QuietHours,
    pub timezone: Tz,
}

impl AdmissionPolicy {
    pub fn from_settings(settings: &AdmissionSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            min_interval_seconds: settings.min_interval_seconds,
            max_per_window: settings.max_per_window,
            window_seconds: WINDOW_SECONDS,
            daily_limit: settings.effective_daily_limit(),
            quiet_hours: QuietHours {
                start: settings.quiet_hours_start,
                end: settings.quiet_hours_end,
            },
            timezone: settings.reference_timezone()?,
        })
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            min_interval_seconds: 600,
            max_per_window: 5,
            window_seconds: WINDOW_SECONDS,
            daily_limit: 50,
            quiet_hours: QuietHours { start: 3, end: 9 },
            timezone: chrono_tz::Australia::Sydney,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overnight_window() {
        let quiet = QuietHours { start: 3, end: 9 };
        assert!(quiet.contains(3));
        assert!(quiet.contains(5));
        assert!(!quiet.contains(9));
        assert!(!quiet.contains(2));
        assert!(!quiet.contains(22));
    }

    #[test]
    fn wrapping_window() {
        let quiet = QuietHours { start: 23, end: 6 };
        assert!(quiet.contains(23));
        assert!(quiet.contains(0));
        assert!(quiet.contains(5));
        assert!(!quiet.contains(6));
        assert!(!quiet.contains(12));
    }

    #[test]
    fn equal_bounds_disable_quiet_hours() {
        let quiet = QuietHours { start: 4, end: 4 };
        assert!((0..24).all(|h| !quiet.contains(h)));
    }

    #[test]
    fn new_account_mode_uses_reduced_limit() {
        let settings = AdmissionSettings {
            new_account_mode: true,
            ..Default::default()
        };
        let policy = AdmissionPolicy::from_settings(&settings).unwrap();
        assert_eq!(policy.daily_limit, 10);
        assert_eq!(policy.window_seconds, 1800);
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let settings = AdmissionSettings {
            timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(AdmissionPolicy::from_settings(&settings).is_err());
    }
}
