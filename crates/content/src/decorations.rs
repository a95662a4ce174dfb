//! Fixed decoration sets used by the assembler.

const DEFAULT_LINK: &str = "t.me/egeyeaimeme";

const PROMOS: [&str; 10] = [
    "👀 We called it early! Next 100x? 👉 {link}",
    "🎯 EgeEye AI spotted this first! Join 👉 {link}",
    "🔥 Another banger from EgeEye! Free signals 👉 {link}",
    "🤖 AI-powered alpha! Don't miss the next one 👉 {link}",
    "💎 Early calls, big gains! Join us 👉 {link}",
    "🚀 Want early access to gems? 👉 {link}",
    "📡 EgeEye AI never sleeps! Follow for alpha 👉 {link}",
    "⚡ Caught another runner! More signals 👉 {link}",
    "🎰 We find gems, you take profits! 👉 {link}",
    "🔮 AI sees what others miss! Join 👉 {link}",
];

const OPENERS: [&str; 8] = ["🚀", "💥", "🔥", "⚡", "💎", "🎯", "📈", "🌙"];

const HASHTAGS: [&str; 8] = [
    "#Solana", "#SOL", "#Memecoin", "#Crypto", "#100x", "#GEM", "#Alpha", "#DeFi",
];

/// Promotional call-to-action lines, opener glyphs, and the hashtag pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorations {
    pub promos: Vec<String>,
    pub openers: Vec<String>,
    pub hashtags: Vec<String>,
}

impl Decorations {
    /// The built-in sets with every promo pointing at `link`.
    pub fn with_channel_link(link: &str) -> Self {
        Self {
            promos: PROMOS.iter().map(|p| p.replace("{link}", link)).collect(),
            openers: OPENERS.iter().map(|s| s.to_string()).collect(),
            hashtags: HASHTAGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for Decorations {
    fn default() -> Self {
        Self::with_channel_link(DEFAULT_LINK)
    }
}
