//! Posting admission for signalcast.
//!
//! Decides, for each pending post, whether it may be dispatched now:
//!
//! ```text
//! rollover -> quiet hours -> daily cap -> 30-min burst window -> min spacing
//! ```
//!
//! The first failing check wins. Statistics live in an explicitly owned
//! [`AdmissionStatistics`] value, persisted through an injected
//! [`StatsStore`] after every mutation.

pub mod controller;
pub mod decision;
pub mod policy;
pub mod stats;
pub mod store;

pub use controller::AdmissionController;
pub use decision::{AdmissionDecision, DenialReason, decide};
pub use policy::{AdmissionPolicy, QuietHours};
pub use stats::AdmissionStatistics;
pub use store::{InMemoryStore, JsonFileStore, StatsStore};
