//! signalcast CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Listen, broadcast, and post through admission control
//! - `status`   — Show posting statistics and the current admission decision
//! - `doctor`   — Check configuration per subsystem
//! - `parse`    — Extract a signal record from text
//! - `compose`  — Compose a post from text with the template body

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "signalcast",
    about = "signalcast — Telegram signal relay with rate-limited social posting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file (defaults to ~/.signalcast/config.toml)
    #[arg(short, long, global = true, env = "SIGNALCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay (broadcast path, plus the social path when enabled)
    Run {
        /// Record posts locally instead of publishing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show posting statistics and what admission would decide now
    Status,

    /// Check configuration for every subsystem
    Doctor,

    /// Extract a signal record from text (argument or stdin)
    Parse {
        text: Option<String>,
    },

    /// Compose a post from text (argument or stdin) using the template body
    Compose {
        text: Option<String>,

        /// Seed for template and decoration choice
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run { dry_run } => commands::run::run(config_path, dry_run).await?,
        Commands::Status => commands::status::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Parse { text } => commands::parse::run(text)?,
        Commands::Compose { text, seed } => commands::compose::run(config_path, text, seed).await?,
    }

    Ok(())
}
