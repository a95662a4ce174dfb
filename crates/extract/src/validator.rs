//! Integrity validation of rewritten candidates.
//!
//! Every externally rewritten body passes through [`validate`] before it may
//! go downstream. Checks run independently so a report lists every missing
//! field, not just the first.

use std::sync::LazyLock;

use regex_lite::Regex;
use signalcast_core::SignalRecord;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("number pattern"));

/// A protected field the candidate failed to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingContractAddress(String),
    MissingTokenName(String),
    /// Holds the full gain; only its numeric part was required.
    MissingGain(String),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingContractAddress(ca) => write!(f, "contract address missing: {ca}"),
            Violation::MissingTokenName(token) => write!(f, "token name missing: {token}"),
            Violation::MissingGain(gain) => write!(f, "gain missing: {gain}"),
        }
    }
}

/// Outcome of validating one candidate against its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations joined for a single log field.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Check that every protected field set on `record` survives in `candidate`.
pub fn validate(record: &SignalRecord, candidate: &str) -> IntegrityReport {
    let mut violations = Vec::new();

    if let Some(ca) = &record.contract_address {
        if !candidate.contains(ca.as_str()) {
            violations.push(Violation::MissingContractAddress(ca.clone()));
        }
    }

    if let Some(token) = &record.token_name {
        if !candidate.contains(token.as_str()) {
            violations.push(Violation::MissingTokenName(token.clone()));
        }
    }

    // Rewriters may localize the unit ("倍" -> "x"), so only the number counts.
    if let Some(gain) = &record.gain {
        if let Some(number) = LEADING_NUMBER.find(gain) {
            if !candidate.contains(number.as_str()) {
                violations.push(Violation::MissingGain(gain.clone()));
            }
        }
    }

    IntegrityReport { violations }
}
