//! Platform adapters for signalcast.
//!
//! - **Telegram** — Bot API long polling of the source chat, plus sending
//!   the cleaned copy to the broadcast chat
//! - **X** — API v2 post creation, the social dispatch collaborator
//! - **Recording** — in-process publisher for dry runs and tests

pub mod recording;
pub mod telegram;
pub mod x;

pub use recording::RecordingPublisher;
pub use telegram::{TelegramChannel, TelegramConfig};
pub use x::{XConfig, XPublisher};
