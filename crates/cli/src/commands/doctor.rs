//! `signalcast doctor` — configuration diagnostics per subsystem.

use std::path::Path;

use signalcast_config::AppConfig;
use signalcast_core::Provider;

pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("🩺 signalcast Doctor — Configuration Diagnostics");
    println!("===============================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ℹ️  No config file at {}, using defaults + environment", path.display());
    }

    let config = match AppConfig::load_with_env(&path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    match config.require_broadcast() {
        Ok(()) => println!("  ✅ Broadcast path configured"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    if config.social.enabled {
        match config.require_social() {
            Ok(()) => println!("  ✅ Social path configured"),
            Err(e) => {
                println!("  ❌ {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ℹ️  Social path disabled (ENABLE_TWITTER=false)");
    }

    if config.has_rewriter() {
        println!("  ✅ Rewriter configured ({})", config.rewriter.model);
        if let Some(api_key) = config.rewriter.api_key.as_deref() {
            let provider = signalcast_providers::OpenAiCompatProvider::new(
                "rewriter",
                &config.rewriter.base_url,
                api_key,
            );
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Rewriter endpoint reachable"),
                Ok(false) => {
                    println!("  ⚠️  Rewriter endpoint rejected the API key");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ⚠️  Rewriter endpoint unreachable: {e}");
                    issues += 1;
                }
            }
        }
    } else {
        println!("  ℹ️  No GEMINI_API_KEY, posts use the template body");
    }

    println!("  ℹ️  Stats file: {}", config.stats_path().display());

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
