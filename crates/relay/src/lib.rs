//! The relay: inbound signals in, admitted posts out.
//!
//! ```text
//! Channel ──▶ SignalPipeline ──▶ broadcast chat
//!                  │
//!                  └─ extract ─ compose ─▶ PostQueue ──▶ PostingWorker ──▶ Publisher
//!                                                         (admission)
//! ```
//!
//! One producer (the pipeline) and exactly one consumer (the worker).
//! The worker alone owns the admission statistics.

pub mod pipeline;
pub mod queue;
pub mod worker;

pub use pipeline::{PipelineOutcome, SignalPipeline};
pub use queue::{PostQueue, QueueItem};
pub use worker::{PostingWorker, ProcessOutcome, WorkerPolicy};
