//! Rewriting providers for signalcast.
//!
//! Every provider implements `signalcast_core::Provider`. Only the
//! OpenAI-compatible chat-completions shape is needed: Gemini, OpenAI,
//! OpenRouter and Ollama all expose it.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
