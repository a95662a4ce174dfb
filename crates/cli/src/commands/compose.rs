//! `signalcast compose` — preview the post a message would produce,
//! using the template body (no rewriter call).

use std::path::Path;

use signalcast_content::{Composer, Decorations};
use signalcast_core::StdRandom;
use signalcast_extract::extract;

use super::{input_text, load_config};

pub async fn run(
    config_path: Option<&Path>,
    text: Option<String>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = input_text(text)?;
    let record = extract(&text);

    if !record.is_postable() {
        anyhow::bail!("no contract address in input; this message would only be broadcast");
    }

    let composer = Composer::new(Decorations::with_channel_link(&config.content.channel_link));
    let mut rng = match seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_os(),
    };
    let post = match composer.compose(&record, &mut rng).await {
        Ok(post) => post,
        Err(report) => anyhow::bail!("no valid post fits: {}", report.summary()),
    };

    println!("{}", post.text);
    println!("\n---");
    println!("chars: {}", post.text.chars().count());
    println!("integrity: ok");
    Ok(())
}
