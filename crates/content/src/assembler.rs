//! Post assembly.
//!
//! Layout of an assembled post:
//!
//! ```text
//! <body>
//!
//! <one promo line>
//!
//! #<TOKEN> <2-3 hashtags from the pool>
//! ```
//!
//! Anything longer than [`MAX_POST_CHARS`] is replaced by the short form.

use signalcast_core::random::{pick, sample};
use signalcast_core::{MAX_POST_CHARS, RandomSource, SignalRecord};

use crate::decorations::Decorations;

fn opener<'a>(decorations: &'a Decorations, rng: &mut dyn RandomSource) -> &'a str {
    pick(rng, &decorations.openers).map_or("🚀", String::as_str)
}

fn promo<'a>(decorations: &'a Decorations, rng: &mut dyn RandomSource) -> &'a str {
    pick(rng, &decorations.promos).map_or("", String::as_str)
}

/// Deterministic body used when no rewriter is configured or its output
/// failed validation.
pub fn template_body(
    record: &SignalRecord,
    decorations: &Decorations,
    rng: &mut dyn RandomSource,
) -> String {
    let opener = opener(decorations, rng);
    let token = record.token_name.as_deref().unwrap_or("This gem");
    let gain = record.gain.as_deref().unwrap_or("big");
    let ca = record.contract_address.as_deref().unwrap_or_default();

    let mut body = match rng.below(5) {
        0 => format!("{opener} {token} pumped {gain}!\n\nCA: {ca}"),
        1 => format!("{opener} {token} just did {gain}!\n\nCA: {ca}"),
        2 => format!("{opener} {token} {gain} and counting!\n\nCA: {ca}"),
        3 => format!("{opener} Another {gain} on {token}!\n\nCA: {ca}"),
        _ => format!("{opener} {token} went {gain}! 🔥\n\nCA: {ca}"),
    };

    if let Some(mc) = &record.market_cap {
        body.push_str(&format!("\n\nMC: {mc}"));
    }

    body
}

/// Body + promo + hashtag line, in that fixed order.
pub fn assemble(
    body: &str,
    record: &SignalRecord,
    decorations: &Decorations,
    rng: &mut dyn RandomSource,
) -> String {
    let promo = promo(decorations, rng);

    let extra = 2 + rng.below(2);
    let mut tags: Vec<String> = Vec::with_capacity(extra + 1);
    if let Some(token) = record.bare_token() {
        tags.push(format!("#{token}"));
    }
    tags.extend(
        sample(rng, &decorations.hashtags, extra)
            .into_iter()
            .cloned(),
    );

    format!("{body}\n\n{promo}\n\n{}", tags.join(" "))
}

/// Opener + token + gain + address + one promo, hard-capped at 280 chars.
///
/// The address is never cut. Space runs out for the promo first, then
/// the opener, and only then for the token line.
pub fn short_form(
    record: &SignalRecord,
    decorations: &Decorations,
    rng: &mut dyn RandomSource,
) -> String {
    let opener = opener(decorations, rng);
    let promo = promo(decorations, rng);
    let token = record.token_name.as_deref().unwrap_or_default();
    let gain = record.gain.as_deref().unwrap_or_default();
    let ca = record.contract_address.as_deref().unwrap_or_default();

    let tail = format!("\n\n{ca}");
    let budget = MAX_POST_CHARS.saturating_sub(tail.chars().count());

    let line = format!("{token} {gain}!");
    let decorated = format!("{opener} {line}");
    let head = if decorated.chars().count() <= budget {
        decorated
    } else {
        truncate_chars(&line, budget)
    };

    let mut short = format!("{head}{tail}");
    let room = MAX_POST_CHARS.saturating_sub(short.chars().count());
    if room > 2 && !promo.is_empty() {
        short.push_str("\n\n");
        short.push_str(&truncate_chars(promo, room - 2));
    }
    short
}

/// Assemble, falling back to the short form past the length ceiling.
pub fn finalize(
    body: &str,
    record: &SignalRecord,
    decorations: &Decorations,
    rng: &mut dyn RandomSource,
) -> String {
    let full = assemble(body, record, decorations, rng);
    if full.chars().count() > MAX_POST_CHARS {
        short_form(record, decorations, rng)
    } else {
        full
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalcast_core::StdRandom;
    use signalcast_extract::validate;

    const KERNEL_CA: &str = "AL9ECCZrSbSdmL8hngxjxTwZvYPpoBtHqGW51pZVBAGS";

    fn kernel() -> SignalRecord {
        SignalRecord {
            token_name: Some("$KERNEL".into()),
            contract_address: Some(KERNEL_CA.into()),
            gain: Some("12.83倍".into()),
            market_cap: Some("$21.80K —> $279.64K".into()),
            ..Default::default()
        }
    }

    #[test]
    fn template_body_carries_protected_fields() {
        let decorations = Decorations::default();
        for seed in 0..20 {
            let mut rng = StdRandom::seeded(seed);
            let body = template_body(&kernel(), &decorations, &mut rng);
            assert!(validate(&kernel(), &body).is_ok(), "seed {seed}: {body}");
            assert!(body.ends_with("MC: $21.80K —> $279.64K"));
        }
    }

    #[test]
    fn template_body_omits_market_cap_line_when_absent() {
        let record = SignalRecord {
            market_cap: None,
            ..kernel()
        };
        let mut rng = StdRandom::seeded(3);
        let body = template_body(&record, &Decorations::default(), &mut rng);
        assert!(!body.contains("MC:"));
    }

    #[test]
    fn assembled_post_structure() {
        let decorations = Decorations::default();
        let mut rng = StdRandom::seeded(11);
        let post = assemble("BODY", &kernel(), &decorations, &mut rng);

        let parts: Vec<&str> = post.split("\n\n").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BODY");
        assert!(decorations.promos.iter().any(|p| p == parts[1]));

        let tags: Vec<&str> = parts[2].split(' ').collect();
        assert_eq!(tags[0], "#KERNEL");
        assert!((3..=4).contains(&tags.len()));
        for tag in &tags[1..] {
            assert!(decorations.hashtags.iter().any(|h| h == tag));
        }
        let mut unique = tags[1..].to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tags.len() - 1);
    }

    #[test]
    fn overlong_post_falls_back_to_short_form() {
        let decorations = Decorations::default();
        let mut rng = StdRandom::seeded(5);
        let body = "x".repeat(300);
        let post = finalize(&body, &kernel(), &decorations, &mut rng);
        assert!(post.chars().count() <= MAX_POST_CHARS);
        assert!(!post.contains('#'));
        assert!(post.contains(KERNEL_CA));
        assert!(post.contains("$KERNEL 12.83倍!"));
    }

    #[test]
    fn short_form_is_hard_truncated() {
        let decorations = Decorations {
            promos: vec!["p".repeat(400)],
            ..Decorations::default()
        };
        let mut rng = StdRandom::seeded(1);
        let short = short_form(&kernel(), &decorations, &mut rng);
        assert_eq!(short.chars().count(), MAX_POST_CHARS);
        assert!(validate(&kernel(), &short).is_ok());
    }

    #[test]
    fn long_token_never_pushes_out_the_address() {
        let decorations = Decorations::default();
        for len in [200, 240, 400] {
            let record = SignalRecord {
                token_name: Some(format!("$A{}", "B".repeat(len))),
                gain: Some("3x".into()),
                ..kernel()
            };
            let mut rng = StdRandom::seeded(len as u64);
            let short = short_form(&record, &decorations, &mut rng);
            assert!(short.chars().count() <= MAX_POST_CHARS, "len {len}");
            assert!(short.contains(KERNEL_CA), "len {len}: {short}");
        }
    }

    #[test]
    fn long_token_that_fits_keeps_every_protected_field() {
        let record = SignalRecord {
            token_name: Some(format!("$A{}", "B".repeat(200))),
            gain: Some("3x".into()),
            ..kernel()
        };
        let mut rng = StdRandom::seeded(6);
        let post = finalize("body", &record, &Decorations::default(), &mut rng);
        assert!(post.chars().count() <= MAX_POST_CHARS);
        assert!(validate(&record, &post).is_ok(), "{post}");
    }

    #[test]
    fn fitting_post_is_kept_whole() {
        let decorations = Decorations::default();
        let mut rng = StdRandom::seeded(8);
        let post = finalize("$KERNEL 12.83x", &kernel(), &decorations, &mut rng);
        assert!(post.starts_with("$KERNEL 12.83x\n\n"));
        assert!(post.contains("#KERNEL"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("倍倍倍", 2), "倍倍");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }
}
