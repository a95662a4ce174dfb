//! `signalcast parse` — show what the extractor finds in a message.

use signalcast_extract::extract;

use super::input_text;

pub fn run(text: Option<String>) -> anyhow::Result<()> {
    let text = input_text(text)?;
    let record = extract(&text);

    println!("{}", serde_json::to_string_pretty(&record)?);
    if !record.is_postable() {
        eprintln!("⚠️  No contract address found: broadcast only, never posted");
    }
    Ok(())
}
