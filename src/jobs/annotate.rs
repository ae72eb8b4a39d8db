//! Annotation stage: XML in the blob store to tagged patents, on a pool of
//! blocking workers that each own one tagger.
//!
//! Workers hand finished patents straight to the bounded downstream channel
//! and take jobs from a queue of `threads` slots, so a slow consumer stalls
//! the workers and then this stage's own inbound channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::annotator::{PatentAnnotator, TaggerFactory};
use crate::models::{AnnotatedPatent, PatentMetadata};
use crate::pipeline::{Emitter, Outbound, PipelineError, Processor};
use crate::services::parse_patent;
use crate::storage::BlobStore;

/// Cap on the wait for workers to exit after the last patent.
pub const POOL_TERMINATION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Annotated patents between two progress lines.
const PROGRESS_INTERVAL: u64 = 10_000;

type JobQueue = Arc<Mutex<mpsc::Receiver<PatentMetadata>>>;

pub struct AnnotationStage {
    threads: usize,
    factory: Arc<dyn TaggerFactory>,
    blob_store: Arc<dyn BlobStore>,
    processed: Arc<AtomicU64>,
    pool: Option<WorkerPool>,
}

impl AnnotationStage {
    pub fn new(threads: usize, factory: Arc<dyn TaggerFactory>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            threads: threads.max(1),
            factory,
            blob_store,
            processed: Arc::new(AtomicU64::new(0)),
            pool: None,
        }
    }

    /// Patents annotated so far by all workers.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Processor for AnnotationStage {
    type Input = PatentMetadata;
    type Output = AnnotatedPatent;

    async fn process(
        &mut self,
        patent: PatentMetadata,
        out: &mut Emitter<AnnotatedPatent>,
    ) -> Result<u64, PipelineError> {
        let pool = self.pool.get_or_insert_with(|| {
            WorkerPool::spawn(
                self.threads,
                &self.factory,
                &self.blob_store,
                &self.processed,
                out.outbound(),
            )
        });
        pool.submit(patent).await?;
        Ok(pool.take_emitted())
    }

    async fn on_success(&mut self, _out: &mut Emitter<AnnotatedPatent>) -> Result<u64, PipelineError> {
        let Some(mut pool) = self.pool.take() else {
            return Ok(0);
        };

        // Workers drain the queue, then exit; the pill must follow their output
        pool.terminate().await?;
        info!("Annotated {} patents", self.processed());
        Ok(pool.take_emitted())
    }

    async fn on_failure(&mut self) {
        if let Some(pool) = self.pool.take() {
            debug!(
                "Aborting annotation workers, {} patents emitted",
                pool.emitted.load(Ordering::Relaxed)
            );
        }
    }
}

struct WorkerPool {
    jobs: Option<mpsc::Sender<PatentMetadata>>,
    failures: mpsc::UnboundedReceiver<PipelineError>,
    workers: Vec<JoinHandle<()>>,
    abort: Arc<AtomicBool>,
    emitted: Arc<AtomicU64>,
    reported: u64,
}

impl WorkerPool {
    fn spawn(
        threads: usize,
        factory: &Arc<dyn TaggerFactory>,
        blob_store: &Arc<dyn BlobStore>,
        processed: &Arc<AtomicU64>,
        out: Option<Outbound<AnnotatedPatent>>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(threads);
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        let queue: JobQueue = Arc::new(Mutex::new(jobs_rx));
        let abort = Arc::new(AtomicBool::new(false));
        let emitted = Arc::new(AtomicU64::new(0));

        debug!("Starting {} annotation workers", threads);
        let workers = (0..threads)
            .map(|_| {
                let worker = Worker {
                    queue: queue.clone(),
                    out: out.clone(),
                    failures: failures_tx.clone(),
                    factory: factory.clone(),
                    blob_store: blob_store.clone(),
                    abort: abort.clone(),
                    processed: processed.clone(),
                    emitted: emitted.clone(),
                };
                tokio::task::spawn_blocking(move || worker.run())
            })
            .collect();

        Self {
            jobs: Some(jobs_tx),
            failures: failures_rx,
            workers,
            abort,
            emitted,
            reported: 0,
        }
    }

    /// Queue a patent, waiting while every worker is busy.
    async fn submit(&mut self, patent: PatentMetadata) -> Result<(), PipelineError> {
        self.check_failures()?;
        let jobs = self.jobs.as_ref().ok_or(PipelineError::Interrupted)?;
        if jobs.send(patent).await.is_err() {
            // Every worker is gone
            self.check_failures()?;
            return Err(PipelineError::Interrupted);
        }
        Ok(())
    }

    fn check_failures(&mut self) -> Result<(), PipelineError> {
        match self.failures.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }

    /// Patents emitted since the last call.
    fn take_emitted(&mut self) -> u64 {
        let emitted = self.emitted.load(Ordering::SeqCst);
        let delta = emitted - self.reported;
        self.reported = emitted;
        delta
    }

    /// Wait for every worker to exit, bounded by [`POOL_TERMINATION_TIMEOUT`].
    async fn terminate(&mut self) -> Result<(), PipelineError> {
        self.jobs = None;
        let workers = std::mem::take(&mut self.workers);
        let joined = tokio::time::timeout(POOL_TERMINATION_TIMEOUT, futures::future::join_all(workers))
            .await
            .map_err(|_| PipelineError::Other("annotation workers did not terminate".to_string()))?;

        self.check_failures()?;
        for result in joined {
            result.map_err(|e| PipelineError::Panicked(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Queued patents are abandoned; running ones finish their current item
        self.abort.store(true, Ordering::SeqCst);
        self.jobs = None;
    }
}

struct Worker {
    queue: JobQueue,
    out: Option<Outbound<AnnotatedPatent>>,
    failures: mpsc::UnboundedSender<PipelineError>,
    factory: Arc<dyn TaggerFactory>,
    blob_store: Arc<dyn BlobStore>,
    abort: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    emitted: Arc<AtomicU64>,
}

impl Worker {
    fn run(self) {
        // Built on the first patent, shut down when this worker exits
        let mut annotator: Option<PatentAnnotator> = None;

        while !self.abort.load(Ordering::SeqCst) {
            let next = match self.queue.lock() {
                Ok(mut queue) => queue.blocking_recv(),
                Err(_) => None,
            };
            let Some(patent) = next else { break };
            if self.abort.load(Ordering::SeqCst) {
                break;
            }

            let annotated = match self.annotate(&mut annotator, patent) {
                Ok(annotated) => annotated,
                Err(err) => {
                    let _ = self.failures.send(err);
                    break;
                }
            };

            let done = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_INTERVAL == 0 {
                info!("Annotated {} patents", done);
            }
            if !self.emit(annotated) {
                break;
            }
        }
    }

    /// Blocks while the downstream channel is full. False once it is closed.
    fn emit(&self, annotated: AnnotatedPatent) -> bool {
        if let Some(out) = &self.out {
            if out.blocking_send(Some(annotated)).is_err() {
                return false;
            }
        }
        self.emitted.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn annotate(
        &self,
        annotator: &mut Option<PatentAnnotator>,
        patent: PatentMetadata,
    ) -> Result<AnnotatedPatent, PipelineError> {
        let annotator = match annotator {
            Some(annotator) => annotator,
            None => annotator.insert(PatentAnnotator::new(self.factory.create_tagger()?)),
        };

        let xml = self.blob_store.read(&patent.patent_number)?;
        let content = parse_patent(&String::from_utf8_lossy(&xml));
        let annotations = annotator.annotate(&content)?;
        debug!(patent = %patent.patent_number, "{} annotations", annotations.len());

        Ok(AnnotatedPatent {
            metadata: patent,
            annotations,
        })
    }
}
