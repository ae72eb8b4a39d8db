//! Stage abstraction and the standard poison-pill loop.

use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::PipelineError;

/// Capacity of every inter-stage channel.
pub const QUEUE_SIZE: usize = 8192;

/// Progress is logged each time this many more items are processed.
pub const LOG_INTERVAL: u64 = 1000;

pub type Inbound<T> = mpsc::Receiver<Option<T>>;
pub type Outbound<T> = mpsc::Sender<Option<T>>;

/// A bounded inter-stage channel.
pub fn channel<T>() -> (Outbound<T>, Inbound<T>) {
    mpsc::channel(QUEUE_SIZE)
}

/// A unit of the pipeline, driven by `PipelineRunner`.
#[async_trait]
pub trait PipelineStage: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Run to completion. Returns `Interrupted` when a channel closes under
    /// the stage.
    async fn run(&mut self) -> Result<(), PipelineError>;

    /// Best-effort cleanup, called once if the pipeline aborts.
    async fn on_failure(&mut self) {}
}

/// Outbound side of a stage. Terminal stages have no channel.
pub struct Emitter<T> {
    out: Option<Outbound<T>>,
}

impl<T: Send> Emitter<T> {
    pub fn new(out: Outbound<T>) -> Self {
        Self { out: Some(out) }
    }

    /// An emitter that discards items, for the last stage.
    pub fn terminal() -> Self {
        Self { out: None }
    }

    /// Send an item downstream, waiting for queue space.
    pub async fn put(&mut self, item: T) -> Result<(), PipelineError> {
        match &self.out {
            Some(out) => out
                .send(Some(item))
                .await
                .map_err(|_| PipelineError::Interrupted),
            None => Ok(()),
        }
    }

    /// A handle on the downstream channel for producers other than the stage
    /// itself. `None` for terminal stages and after [`finish`](Self::finish).
    ///
    /// Items sent through it share the channel's capacity, so blocked
    /// producers see the same backpressure as `put`.
    pub fn outbound(&self) -> Option<Outbound<T>> {
        self.out.clone()
    }

    /// Send the poison pill and release the channel. Later calls are no-ops.
    pub async fn finish(&mut self) -> Result<(), PipelineError> {
        if let Some(out) = self.out.take() {
            out.send(None)
                .await
                .map_err(|_| PipelineError::Interrupted)?;
        }
        Ok(())
    }
}

/// Item-level behaviour plugged into a [`Stage`].
///
/// Counts returned by `process` and `on_success` feed progress logging.
#[async_trait]
pub trait Processor: Send {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn process(
        &mut self,
        item: Self::Input,
        out: &mut Emitter<Self::Output>,
    ) -> Result<u64, PipelineError>;

    /// Called on the poison pill, before it is forwarded. Flush buffered
    /// work here.
    async fn on_success(&mut self, _out: &mut Emitter<Self::Output>) -> Result<u64, PipelineError> {
        Ok(0)
    }

    async fn on_failure(&mut self) {}
}

/// A stage with an inbound channel, running the standard loop around a
/// [`Processor`].
pub struct Stage<P: Processor> {
    name: String,
    processor: P,
    inbound: Inbound<P::Input>,
    out: Emitter<P::Output>,
    processed: u64,
}

impl<P: Processor> Stage<P> {
    pub fn new(
        name: impl Into<String>,
        processor: P,
        inbound: Inbound<P::Input>,
        out: Emitter<P::Output>,
    ) -> Self {
        Self {
            name: name.into(),
            processor,
            inbound,
            out,
            processed: 0,
        }
    }
}

#[async_trait]
impl<P: Processor> PipelineStage for Stage<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> Result<(), PipelineError> {
        let started = Instant::now();

        loop {
            // A closed channel without a pill means upstream went away
            let item = self
                .inbound
                .recv()
                .await
                .ok_or(PipelineError::Interrupted)?;

            let Some(item) = item else {
                self.processed += self.processor.on_success(&mut self.out).await?;
                self.out.finish().await?;
                info!(stage = %self.name, "Done, {} entries processed", self.processed);
                return Ok(());
            };

            let before = self.processed;
            self.processed += self.processor.process(item, &mut self.out).await?;

            if self.processed / LOG_INTERVAL != before / LOG_INTERVAL {
                let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
                debug!(
                    stage = %self.name,
                    "Processed entry #{} at {:.0} entries/s",
                    self.processed,
                    self.processed as f64 / elapsed
                );
            }
        }
    }

    async fn on_failure(&mut self) {
        self.processor.on_failure().await;
    }
}

/// First stage: emits a fixed list of items, then the poison pill.
pub struct SourceStage<T> {
    name: String,
    items: Vec<T>,
    out: Emitter<T>,
}

impl<T: Send> SourceStage<T> {
    pub fn new(name: impl Into<String>, items: Vec<T>, out: Outbound<T>) -> Self {
        Self {
            name: name.into(),
            items,
            out: Emitter::new(out),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> PipelineStage for SourceStage<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) -> Result<(), PipelineError> {
        let total = self.items.len();
        for item in std::mem::take(&mut self.items) {
            self.out.put(item).await?;
        }
        self.out.finish().await?;
        debug!(stage = %self.name, "Emitted {} entries", total);
        Ok(())
    }
}
