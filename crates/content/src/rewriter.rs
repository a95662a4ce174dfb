//! The generative rewrite collaborator.
//!
//! A rewriter turns a record into a short candidate body. Its output is
//! untrusted: the composer always validates it before use.

use std::sync::Arc;

use async_trait::async_trait;
use signalcast_core::{Provider, ProviderError, ProviderRequest, SignalRecord};
use tracing::debug;

#[async_trait]
pub trait Rewriter: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    async fn rewrite(&self, record: &SignalRecord) -> Result<String, ProviderError>;
}

/// Prompt asking for a short English post that keeps every protected field.
pub fn rewrite_prompt(record: &SignalRecord) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "(none)".into());
    format!(
        "You are a crypto Twitter author. Rewrite the signal below as a short, punchy English tweet.\n\
         \n\
         [NEVER MODIFY THESE VALUES — copy them exactly]:\n\
         - Token: {token}\n\
         - CA: {ca}\n\
         - Gain: {gain}\n\
         - Market cap: {mc}\n\
         \n\
         [Rules]:\n\
         1. Write in English\n\
         2. Short and punchy, like a real person's tweet\n\
         3. Emoji are fine\n\
         4. Must include the token, the CA and the gain\n\
         5. No hashtags (added separately)\n\
         6. No promotional links (added separately)\n\
         7. At most 150 characters\n\
         \n\
         [Original signal]:\n\
         {raw}\n\
         \n\
         Output only the tweet text, no explanation:",
        token = field(&record.token_name),
        ca = field(&record.contract_address),
        gain = field(&record.gain),
        mc = field(&record.market_cap),
        raw = record.raw_text,
    )
}

/// Rewriter backed by any chat-completions [`Provider`].
pub struct ProviderRewriter {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderRewriter {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Rewriter for ProviderRewriter {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn rewrite(&self, record: &SignalRecord) -> Result<String, ProviderError> {
        let request = ProviderRequest::prompt(&self.model, rewrite_prompt(record));
        debug!(provider = %self.provider.name(), model = %self.model, "Requesting rewrite");

        let response = self.provider.complete(request).await?;
        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}
