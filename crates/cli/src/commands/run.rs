//! `signalcast run` — the long-running relay.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use signalcast_admission::{AdmissionController, AdmissionPolicy, JsonFileStore};
use signalcast_channels::{RecordingPublisher, TelegramChannel, TelegramConfig, XConfig, XPublisher};
use signalcast_config::AppConfig;
use signalcast_content::{Composer, Decorations, ProviderRewriter};
use signalcast_core::{Channel, Clock, Publisher, StdRandom, SystemClock};
use signalcast_providers::OpenAiCompatProvider;
use signalcast_relay::{PostQueue, PostingWorker, SignalPipeline, WorkerPolicy};
use tracing::{info, warn};

use super::load_config;

/// Decorations plus the configured rewriter, if any.
pub fn build_composer(config: &AppConfig) -> Composer {
    let composer = Composer::new(Decorations::with_channel_link(&config.content.channel_link));
    let Some(api_key) = config.rewriter.api_key.as_deref() else {
        return composer;
    };

    let name = if config.rewriter.base_url.contains("generativelanguage") {
        "gemini"
    } else {
        "openai-compat"
    };
    let provider = OpenAiCompatProvider::new(name, &config.rewriter.base_url, api_key);
    composer.with_rewriter(Arc::new(ProviderRewriter::new(
        Arc::new(provider),
        &config.rewriter.model,
    )))
}

fn telegram_config(config: &AppConfig) -> TelegramConfig {
    let t = &config.telegram;
    let mut tg = TelegramConfig::new(
        t.bot_token.clone().unwrap_or_default(),
        t.source_channel.clone().unwrap_or_default(),
    );
    if let Some(url) = &t.api_url {
        tg.api_url = url.clone();
    }
    tg
}

fn publisher(config: &AppConfig, dry_run: bool) -> Arc<dyn Publisher> {
    if dry_run {
        return Arc::new(RecordingPublisher::new());
    }
    let mut x = XConfig::new(config.social.access_token.clone().unwrap_or_default());
    if let Some(url) = &config.social.api_url {
        x.api_url = url.clone();
    }
    Arc::new(XPublisher::new(x))
}

pub async fn run(config_path: Option<&Path>, dry_run: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    config
        .require_broadcast()
        .context("Broadcast path cannot start")?;
    if !dry_run {
        config
            .require_social()
            .context("Social path cannot start (set ENABLE_TWITTER=false to run broadcast only)")?;
    }

    let tz = config.admission.reference_timezone()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let composer = build_composer(&config);
    let rewriter_mode = if composer.has_rewriter() {
        config.rewriter.model.as_str()
    } else {
        "template"
    };

    info!(
        local_time = %clock.now().with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z"),
        source = ?config.telegram.source_channel,
        dest = ?config.telegram.dest_channel,
        social = config.social.enabled,
        dry_run,
        rewriter = rewriter_mode,
        "signalcast starting"
    );

    let channel = Arc::new(TelegramChannel::new(telegram_config(&config)));
    let inbound = channel
        .start()
        .await
        .context("Failed to start Telegram channel")?;

    let mut pipeline = SignalPipeline::new(
        channel.clone(),
        config.telegram.dest_channel.clone().unwrap_or_default(),
        config.content.footer.clone(),
        composer,
        clock.clone(),
        Box::new(StdRandom::from_os()),
    );

    let mut worker_task = None;
    if config.social.enabled {
        let policy = AdmissionPolicy::from_settings(&config.admission)?;
        info!(
            min_interval = policy.min_interval_seconds,
            per_window = policy.max_per_window,
            daily_limit = policy.daily_limit,
            quiet_start = policy.quiet_hours.start,
            quiet_end = policy.quiet_hours.end,
            stats = %config.stats_path().display(),
            "Social path enabled"
        );

        let queue = Arc::new(PostQueue::new());
        let controller = AdmissionController::open(
            policy,
            Arc::new(JsonFileStore::new(config.stats_path())),
            clock.clone(),
        );
        let worker = PostingWorker::new(
            queue.clone(),
            controller,
            publisher(&config, dry_run),
            WorkerPolicy::from_settings(&config.worker),
            Box::new(StdRandom::from_os()),
        );
        worker_task = Some(tokio::spawn(worker.run()));
        pipeline = pipeline.with_queue(queue);
    } else {
        info!("Social path disabled, broadcast only");
    }

    let pipeline_task = tokio::spawn(pipeline.run(inbound));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        result = pipeline_task => {
            if let Err(e) = result {
                warn!(error = %e, "Pipeline task ended abnormally");
            }
        }
    }

    if let Some(task) = worker_task {
        task.abort();
    }
    channel.stop().await?;
    info!("signalcast stopped");
    Ok(())
}
