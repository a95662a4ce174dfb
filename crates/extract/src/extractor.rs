//! Entity extraction from free-form signal text.
//!
//! Field rules, in precedence order:
//!
//! ```text
//! token      first  $<letter><alnum>*                      -> "$KERNEL"
//! address    first valid base58 run of 32..=44 chars        -> SOL
//!            else first 0x + 40 hex                         -> BSC
//! gain       first <number><ws>*(倍|x|X)                     -> "12.83倍"
//! market cap first $a[KMB] <arrow> $b[KMB] change expression,
//!            else the LAST standalone $<number>[KMB]
//! ```
//!
//! Extraction never fails: anything not found is left unset.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use signalcast_core::{Chain, SignalRecord};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z][A-Za-z0-9]*)").expect("token pattern"));

static SOL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([1-9A-HJ-NP-Za-km-z]{32,44})\b").expect("base58 address pattern")
});

static BSC_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(0x[a-fA-F0-9]{40})\b").expect("hex address pattern"));

static GAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*(倍|x|X)").expect("gain pattern"));

static MARKET_CAP_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$[\d.]+\s*[KMB]?\s*[—\-→>]+\s*\$[\d.]+\s*[KMB]?").expect("market cap change pattern")
});

static MARKET_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+\.?\d*)\s*(K|M|B)?").expect("market cap pattern"));

/// Minimum distinct characters for a base58 run to count as an address.
const MIN_DISTINCT_CHARS: usize = 5;

/// Parse a signal message into a record.
pub fn extract(text: &str) -> SignalRecord {
    let mut record = SignalRecord {
        raw_text: text.to_string(),
        ..Default::default()
    };

    record.token_name = TOKEN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| format!("${}", m.as_str()));

    if let Some(ca) = find_base58_address(text) {
        record.contract_address = Some(ca);
        record.chain = Chain::Sol;
    } else if let Some(m) = BSC_ADDRESS.captures(text).and_then(|c| c.get(1)) {
        record.contract_address = Some(m.as_str().to_string());
        record.chain = Chain::Bsc;
    }

    record.gain = find_gain(text);
    record.market_cap = find_market_cap(text);

    record
}

fn find_base58_address(text: &str) -> Option<String> {
    SOL_ADDRESS
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|candidate| is_plausible_address(candidate))
        .map(str::to_string)
}

/// Rejects placeholder runs such as `1111…` or repeated-glyph filler.
fn is_plausible_address(candidate: &str) -> bool {
    let len = candidate.chars().count();
    if !(32..=44).contains(&len) {
        return false;
    }
    candidate.chars().collect::<HashSet<_>>().len() >= MIN_DISTINCT_CHARS
}

fn find_gain(text: &str) -> Option<String> {
    for caps in GAIN.captures_iter(text) {
        let (Some(whole), Some(number), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        // `0x1f…` is a hex literal, not "0 times".
        let followed_by_alnum = text[whole.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        if unit.as_str().eq_ignore_ascii_case("x") && followed_by_alnum {
            continue;
        }
        return Some(format!("{}{}", number.as_str(), unit.as_str()));
    }
    None
}

fn find_market_cap(text: &str) -> Option<String> {
    if let Some(m) = MARKET_CAP_CHANGE.find(text) {
        return Some(m.as_str().trim_end().to_string());
    }

    // Later mentions carry the updated figure.
    MARKET_CAP.captures_iter(text).last().map(|caps| {
        let value = caps.get(1).map_or("", |m| m.as_str());
        let unit = caps.get(2).map_or("", |m| m.as_str());
        format!("${value}{unit}")
    })
}
