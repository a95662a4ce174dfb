//! `signalcast status` — persisted statistics and the decision admission
//! would make right now. Read-only: nothing is written back.

use std::path::Path;

use chrono::{TimeZone, Utc};
use signalcast_admission::{AdmissionDecision, AdmissionPolicy, JsonFileStore, StatsStore, decide};

use super::load_config;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let policy = AdmissionPolicy::from_settings(&config.admission)?;
    let store = JsonFileStore::new(config.stats_path());
    let mut stats = store.load()?;
    let now = Utc::now();

    println!("📡 signalcast Status");
    println!("====================");
    println!("  Stats file:   {}", store.path().display());
    println!(
        "  Local time:   {}",
        now.with_timezone(&policy.timezone).format("%Y-%m-%d %H:%M %Z")
    );
    println!(
        "  Day key:      {}",
        stats
            .day_key
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into())
    );
    println!("  Posts today:  {} / {}", stats.posts_today, policy.daily_limit);
    println!(
        "  Last 30 min:  {} / {}",
        stats
            .recent_post_times
            .iter()
            .filter(|&&t| t > now.timestamp() as f64 - policy.window_seconds as f64)
            .count(),
        policy.max_per_window
    );
    if let Some(last) = stats.latest_recent() {
        if let Some(at) = Utc.timestamp_opt(last as i64, 0).single() {
            println!(
                "  Last post:    {}",
                at.with_timezone(&policy.timezone).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }
    println!(
        "  Quiet hours:  {:02}:00–{:02}:00",
        policy.quiet_hours.start, policy.quiet_hours.end
    );
    println!(
        "  Social path:  {}",
        if config.social.enabled { "enabled" } else { "disabled" }
    );

    // Decide on a copy; the persisted record is left as is.
    match decide(now, &mut stats, &policy) {
        AdmissionDecision::Allowed => println!("\n  ✅ A post would be allowed now"),
        AdmissionDecision::Denied {
            reason,
            retry_after,
        } => match retry_after {
            Some(wait) => println!("\n  ⏳ Denied now: {reason} (retry in {}s)", wait.as_secs()),
            None => println!("\n  ⛔ Denied now: {reason}"),
        },
    }

    Ok(())
}
