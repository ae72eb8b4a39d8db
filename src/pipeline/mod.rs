//! Bounded-queue, multi-stage pipeline runtime.
//!
//! Stages run concurrently and are connected by bounded channels of
//! `Option<T>`; `None` is the poison pill that tells a stage its upstream is
//! done. The runner fails fast: the first stage error cancels every other
//! stage and becomes the pipeline's result.

mod error;
mod runner;
mod stage;

pub use error::PipelineError;
pub use runner::PipelineRunner;
pub use stage::{
    channel, Emitter, Inbound, Outbound, PipelineStage, Processor, SourceStage, Stage,
    LOG_INTERVAL, QUEUE_SIZE,
};
