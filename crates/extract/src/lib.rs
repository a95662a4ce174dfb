//! Signal field extraction and integrity validation.
//!
//! The extractor turns free-form signal text into a [`SignalRecord`]; the
//! validator checks that a rewritten candidate still carries the record's
//! protected fields verbatim.
//!
//! [`SignalRecord`]: signalcast_core::SignalRecord

pub mod extractor;
pub mod validator;

pub use extractor::extract;
pub use validator::{IntegrityReport, Violation, validate};
