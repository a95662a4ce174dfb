//! # signalcast core
//!
//! Domain types, collaborator traits, and error definitions for the signal
//! relay. This crate has **no transport dependencies** — it defines the
//! model that the extractor, assembler, admission controller and channel
//! adapters all implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (message source, rewriter, social publisher)
//! is a trait here. Implementations live in their respective crates, so the
//! pipeline can be exercised in tests with scripted stand-ins.

pub mod channel;
pub mod clock;
pub mod error;
pub mod message;
pub mod provider;
pub mod publisher;
pub mod random;
pub mod signal;

// Re-export key types at crate root for ergonomics
pub use channel::{Attachment, AttachmentKind, Channel, ChannelId, ChannelMessage};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChannelError, Error, ProviderError, Result, StorageError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use publisher::{MAX_POST_CHARS, PostReceipt, Publisher};
pub use random::{RandomSource, StdRandom};
pub use signal::{Chain, SignalRecord};
