pub mod compose;
pub mod doctor;
pub mod parse;
pub mod run;
pub mod status;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use signalcast_config::AppConfig;

/// Load from `path` (or the default location) with environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.context("Failed to load config")
}

/// The text argument, or all of stdin when absent.
pub fn input_text(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
