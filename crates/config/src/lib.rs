//! Configuration loading, validation, and management for signalcast.
//!
//! Loads configuration from `~/.signalcast/config.toml` with environment
//! variable overrides. The environment keys match the ones the deployed
//! relay has always read (`TWITTER_DAILY_LIMIT`, `SOURCE_CHANNEL`, ...).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Length of the burst-limit sliding window. Not configurable.
pub const WINDOW_SECONDS: u64 = 1800;

/// The root configuration structure.
///
/// Maps directly to `~/.signalcast/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram source and broadcast channels
    #[serde(default)]
    pub telegram: TelegramSettings,

    /// Social posting path (X)
    #[serde(default)]
    pub social: SocialSettings,

    /// Posting admission limits
    #[serde(default)]
    pub admission: AdmissionSettings,

    /// Queue worker backoff policy
    #[serde(default)]
    pub worker: WorkerSettings,

    /// Generative rewriter
    #[serde(default)]
    pub rewriter: RewriterSettings,

    /// Promotional decorations
    #[serde(default)]
    pub content: ContentSettings,

    /// Where durable state is kept
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Bot token from @BotFather
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Chat the signals are read from (`@username` or numeric id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_channel: Option<String>,

    /// Chat the cleaned copy is forwarded to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_channel: Option<String>,

    /// Override for the Bot API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("source_channel", &self.source_channel)
            .field("dest_channel", &self.dest_channel)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SocialSettings {
    /// When false only the broadcast path runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OAuth 2.0 user-context access token with `tweet.write`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Override for the X API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Default for SocialSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            access_token: None,
            api_url: None,
        }
    }
}

impl std::fmt::Debug for SocialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialSettings")
            .field("enabled", &self.enabled)
            .field("access_token", &redact(&self.access_token))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionSettings {
    #[serde(default = "default_min_interval")]
    pub min_interval_seconds: u64,

    /// Posts allowed per 30-minute window
    #[serde(default = "default_max_per_window")]
    pub max_per_window: usize,

    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Use `reduced_daily_limit` instead of `daily_limit`
    #[serde(default)]
    pub new_account_mode: bool,

    #[serde(default = "default_reduced_daily_limit")]
    pub reduced_daily_limit: u32,

    /// Hour of day (reference timezone) the quiet window starts
    #[serde(default = "default_quiet_start")]
    pub quiet_hours_start: u32,

    /// Hour of day (reference timezone) the quiet window ends, exclusive
    #[serde(default = "default_quiet_end")]
    pub quiet_hours_end: u32,

    /// IANA timezone for day rollover and quiet hours
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_min_interval() -> u64 {
    600
}
fn default_max_per_window() -> usize {
    5
}
fn default_daily_limit() -> u32 {
    50
}
fn default_reduced_daily_limit() -> u32 {
    10
}
fn default_quiet_start() -> u32 {
    3
}
fn default_quiet_end() -> u32 {
    9
}
fn default_timezone() -> String {
    "Australia/Sydney".into()
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            min_interval_seconds: default_min_interval(),
            max_per_window: default_max_per_window(),
            daily_limit: default_daily_limit(),
            new_account_mode: false,
            reduced_daily_limit: default_reduced_daily_limit(),
            quiet_hours_start: default_quiet_start(),
            quiet_hours_end: default_quiet_end(),
            timezone: default_timezone(),
        }
    }
}

impl AdmissionSettings {
    /// The daily cap currently in force.
    pub fn effective_daily_limit(&self) -> u32 {
        if self.new_account_mode {
            self.reduced_daily_limit
        } else {
            self.daily_limit
        }
    }

    /// Parse the configured reference timezone.
    pub fn reference_timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            ConfigError::ValidationError(format!("unknown timezone '{}'", self.timezone))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Backoff after a quiet-hours denial
    #[serde(default = "default_quiet_backoff")]
    pub quiet_hours_backoff_seconds: u64,

    /// Extra random delay added to rate-limit retry delays
    #[serde(default = "default_jitter_min")]
    pub retry_jitter_min_seconds: u64,
    #[serde(default = "default_jitter_max")]
    pub retry_jitter_max_seconds: u64,

    /// Random pause after every processed item
    #[serde(default = "default_pause_min")]
    pub pause_min_seconds: u64,
    #[serde(default = "default_pause_max")]
    pub pause_max_seconds: u64,

    /// Pause after an unexpected processing error
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,
}

fn default_quiet_backoff() -> u64 {
    1800
}
fn default_jitter_min() -> u64 {
    10
}
fn default_jitter_max() -> u64 {
    30
}
fn default_pause_min() -> u64 {
    5
}
fn default_pause_max() -> u64 {
    15
}
fn default_error_backoff() -> u64 {
    30
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            quiet_hours_backoff_seconds: default_quiet_backoff(),
            retry_jitter_min_seconds: default_jitter_min(),
            retry_jitter_max_seconds: default_jitter_max(),
            pause_min_seconds: default_pause_min(),
            pause_max_seconds: default_pause_max(),
            error_backoff_seconds: default_error_backoff(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RewriterSettings {
    /// No key = template mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_rewriter_url")]
    pub base_url: String,

    #[serde(default = "default_rewriter_model")]
    pub model: String,
}

fn default_rewriter_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".into()
}
fn default_rewriter_model() -> String {
    "gemini-2.0-flash".into()
}

impl Default for RewriterSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_rewriter_url(),
            model: default_rewriter_model(),
        }
    }
}

impl std::fmt::Debug for RewriterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriterSettings")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSettings {
    /// Link inserted into every promotional line
    #[serde(default = "default_channel_link")]
    pub channel_link: String,

    /// Appended to every broadcast copy
    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_channel_link() -> String {
    "t.me/egeyeaimeme".into()
}
fn default_footer() -> String {
    "\n--------------------\n🚀 加入 EgeEye，抓住下一个 100 倍！\n👉 t.me/egeyeaimeme\n".into()
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            channel_link: default_channel_link(),
            footer: default_footer(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Defaults to `~/.signalcast/posting_stats.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path, then apply environment
    /// overrides (highest priority) and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        Self::load_with_env(&path)
    }

    /// Load from a specific file, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-style lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TG_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = get("SOURCE_CHANNEL") {
            self.telegram.source_channel = Some(v);
        }
        if let Some(v) = get("DEST_CHANNEL") {
            self.telegram.dest_channel = Some(v);
        }
        if let Some(v) = get("MY_FOOTER") {
            self.content.footer = v;
        }
        if let Some(v) = get("VIP_CHANNEL") {
            self.content.channel_link = v;
        }
        if let Some(v) = get("ENABLE_TWITTER") {
            self.social.enabled = parse_flag(&v);
        }
        if let Some(v) = get("X_ACCESS_TOKEN") {
            self.social.access_token = Some(v);
        }
        if let Some(v) = get("TWITTER_MIN_INTERVAL") {
            self.admission.min_interval_seconds = parse_number("TWITTER_MIN_INTERVAL", &v)?;
        }
        if let Some(v) = get("TWITTER_MAX_PER_30MIN") {
            self.admission.max_per_window = parse_number("TWITTER_MAX_PER_30MIN", &v)?;
        }
        if let Some(v) = get("TWITTER_DAILY_LIMIT") {
            self.admission.daily_limit = parse_number("TWITTER_DAILY_LIMIT", &v)?;
        }
        if let Some(v) = get("TWITTER_NEW_ACCOUNT") {
            self.admission.new_account_mode = parse_flag(&v);
        }
        if let Some(v) = get("TWITTER_NEW_ACCOUNT_LIMIT") {
            self.admission.reduced_daily_limit = parse_number("TWITTER_NEW_ACCOUNT_LIMIT", &v)?;
        }
        if let Some(v) = get("QUIET_HOURS_START") {
            self.admission.quiet_hours_start = parse_number("QUIET_HOURS_START", &v)?;
        }
        if let Some(v) = get("QUIET_HOURS_END") {
            self.admission.quiet_hours_end = parse_number("QUIET_HOURS_END", &v)?;
        }
        if let Some(v) = get("REFERENCE_TIMEZONE") {
            self.admission.timezone = v;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.rewriter.api_key = Some(v);
        }
        if let Some(v) = get("REWRITER_BASE_URL") {
            self.rewriter.base_url = v;
        }
        if let Some(v) = get("REWRITER_MODEL") {
            self.rewriter.model = v;
        }
        if let Some(v) = get("STATS_FILE") {
            self.storage.stats_file = Some(PathBuf::from(v));
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".signalcast")
    }

    /// Resolved location of the persisted posting statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.storage
            .stats_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("posting_stats.json"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.admission;
        if a.quiet_hours_start > 23 || a.quiet_hours_end > 23 {
            return Err(ConfigError::ValidationError(
                "quiet hour bounds must be between 0 and 23".into(),
            ));
        }
        if a.max_per_window == 0 {
            return Err(ConfigError::ValidationError(
                "max_per_window must be at least 1".into(),
            ));
        }
        a.reference_timezone()?;

        let w = &self.worker;
        if w.retry_jitter_min_seconds > w.retry_jitter_max_seconds
            || w.pause_min_seconds > w.pause_max_seconds
        {
            return Err(ConfigError::ValidationError(
                "worker min delays must not exceed max delays".into(),
            ));
        }

        Ok(())
    }

    /// Settings the broadcast path cannot run without.
    pub fn require_broadcast(&self) -> Result<(), ConfigError> {
        let t = &self.telegram;
        let missing: Vec<&'static str> = [
            ("TG_BOT_TOKEN", t.bot_token.is_none()),
            ("SOURCE_CHANNEL", t.source_channel.is_none()),
            ("DEST_CHANNEL", t.dest_channel.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing {
                subsystem: "broadcast",
                keys: missing,
            })
        }
    }

    /// Settings the social path cannot run without. Always passes when the
    /// social path is disabled.
    pub fn require_social(&self) -> Result<(), ConfigError> {
        if !self.social.enabled {
            return Ok(());
        }
        if self.social.access_token.is_none() {
            return Err(ConfigError::Missing {
                subsystem: "social",
                keys: vec!["X_ACCESS_TOKEN"],
            });
        }
        Ok(())
    }

    /// Whether a rewriting model is configured (otherwise template mode).
    pub fn has_rewriter(&self) -> bool {
        self.rewriter.api_key.is_some()
    }
}

/// Deployed convention: only a case-insensitive "true" enables a flag.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} must be a number, got '{value}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required settings for the {subsystem} path: {}", .keys.join(", "))]
    Missing {
        subsystem: &'static str,
        keys: Vec<&'static str>,
    },
}
