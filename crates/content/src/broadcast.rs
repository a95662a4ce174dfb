//! Cleaning of forwarded copies for the broadcast channel.
//!
//! Foreign invite links and `@handle` mentions are stripped, then the
//! relay's own footer is appended.

use std::sync::LazyLock;

use regex_lite::Regex;

static INVITE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://t\.me/[a-zA-Z0-9_]+").expect("invite link pattern"));

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[a-zA-Z0-9_]+").expect("handle pattern"));

pub fn clean_for_broadcast(text: &str, footer: &str) -> String {
    let without_links = INVITE_LINK.replace_all(text, "");
    let cleaned = HANDLE.replace_all(&without_links, "");
    format!("{}\n{footer}", cleaned.trim())
}
