//! The structured signal record extracted from an inbound message.
//!
//! A `SignalRecord` is derived once per inbound message and never mutated
//! afterwards. The protected fields (contract address, token name, gain)
//! must survive any rewriting step verbatim.

use serde::{Deserialize, Serialize};

/// The chain a contract address belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    /// Solana (base58 addresses). The default.
    #[default]
    Sol,
    /// BNB Smart Chain (`0x` + 40 hex addresses).
    Bsc,
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Sol => write!(f, "SOL"),
            Chain::Bsc => write!(f, "BSC"),
        }
    }
}

/// Fields extracted from a free-form signal message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// `$`-prefixed ticker, e.g. `$KERNEL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,

    /// On-chain contract address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    /// Only meaningful when `contract_address` is set.
    #[serde(default)]
    pub chain: Chain,

    /// Number plus multiplier unit as captured, e.g. `12.83倍`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<String>,

    /// A single value (`$279.64K`) or a change expression (`$21.80K —> $279.64K`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,

    /// The original message text.
    pub raw_text: String,
}

impl SignalRecord {
    /// Only records with a contract address may enter the social pipeline.
    pub fn is_postable(&self) -> bool {
        self.contract_address.is_some()
    }

    /// Short, log-friendly prefix of the contract address.
    pub fn ca_fragment(&self) -> String {
        match &self.contract_address {
            Some(ca) if ca.chars().count() > 8 => {
                let head: String = ca.chars().take(8).collect();
                format!("{head}…")
            }
            Some(ca) => ca.clone(),
            None => "-".into(),
        }
    }

    /// The token name without its `$` prefix, for hashtags.
    pub fn bare_token(&self) -> Option<String> {
        self.token_name.as_ref().map(|t| t.replace('$', ""))
    }
}
