//! Error types for the signalcast domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Integrity violations and admission denials are *not* errors: they are
//! ordinary outcomes returned as data by the validator and the controller.

use thiserror::Error;

/// The top-level error type for all signalcast operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Rewriter provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel / publisher errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Statistics persistence ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O failure on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Corrupt statistics record: {0}")]
    Corrupt(String),
}
