//! Persistence stage: commits annotated patents in fixed-size batches.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::models::{AnnotatedPatent, Dictionary};
use crate::pipeline::{Emitter, PipelineError, Processor};
use crate::repository::AnnotationRepository;

/// Patents per commit.
pub const DEFAULT_BATCH_SIZE: usize = 92;

pub struct PersistenceStage {
    repo: AnnotationRepository,
    annotator_id: i32,
    dictionary: Arc<Dictionary>,
    batch_size: usize,
    buffer: Vec<AnnotatedPatent>,
    committed: usize,
}

impl PersistenceStage {
    pub fn new(
        repo: AnnotationRepository,
        annotator_id: i32,
        dictionary: Arc<Dictionary>,
        batch_size: usize,
    ) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            repo,
            annotator_id,
            dictionary,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            committed: 0,
        }
    }

    async fn flush(&mut self) -> Result<u64, PipelineError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let summary = self
            .repo
            .save_batch(self.annotator_id, &self.dictionary, &batch)
            .await?;

        self.committed += summary.patents;
        debug!(
            "Committed {} patents, {} annotations, {} frequencies",
            summary.patents, summary.annotations, summary.frequencies
        );
        if summary.dropped > 0 {
            warn!("{} annotations were dropped from the last batch", summary.dropped);
        }
        Ok(summary.patents as u64)
    }
}

#[async_trait]
impl Processor for PersistenceStage {
    type Input = AnnotatedPatent;
    type Output = ();

    async fn process(&mut self, patent: AnnotatedPatent, _out: &mut Emitter<()>) -> Result<u64, PipelineError> {
        self.buffer.push(patent);
        if self.buffer.len() >= self.batch_size {
            return self.flush().await;
        }
        Ok(0)
    }

    async fn on_success(&mut self, _out: &mut Emitter<()>) -> Result<u64, PipelineError> {
        let flushed = self.flush().await?;
        info!("Persisted {} annotated patents", self.committed);
        Ok(flushed)
    }

    async fn on_failure(&mut self) {
        if !self.buffer.is_empty() {
            debug!("Discarding {} uncommitted patents", self.buffer.len());
            self.buffer.clear();
        }
    }
}
