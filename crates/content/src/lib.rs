//! Turning signal records into finished posts.
//!
//! - **decorations** — promotional lines, openers and the hashtag pool
//! - **assembler** — template body, final assembly, 280-char short form
//! - **rewriter** — the generative rewrite collaborator and its prompt
//! - **composer** — rewrite → validate → fallback → assemble
//! - **broadcast** — cleaning of forwarded copies for the broadcast channel

pub mod assembler;
pub mod broadcast;
pub mod composer;
pub mod decorations;
pub mod rewriter;

pub use assembler::{assemble, finalize, short_form, template_body};
pub use broadcast::clean_for_broadcast;
pub use composer::{BodySource, ComposedPost, Composer};
pub use decorations::Decorations;
pub use rewriter::{ProviderRewriter, Rewriter, rewrite_prompt};
