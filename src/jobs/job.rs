//! One incremental annotation run.

use std::sync::Arc;

use tracing::info;

use super::{AnnotationStage, PersistenceStage, DEFAULT_BATCH_SIZE};
use crate::annotator::TaggerFactory;
use crate::models::{AnnotatorMetadata, Dictionary, PatentMetadata};
use crate::pipeline::{channel, Emitter, PipelineError, PipelineRunner, SourceStage, Stage};
use crate::repository::DbContext;
use crate::services::{PatentDiscovery, XmlFetcher};
use crate::storage::BlobStore;

/// Tunables of an annotation run.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Annotation worker threads.
    pub threads: usize,
    /// Patents per persistence transaction.
    pub batch_size: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// New patents copied from the upstream catalog.
    pub discovered: usize,
    /// Patents without a mark for this annotator.
    pub unannotated: usize,
    /// Patents sent through the pipeline.
    pub annotated: usize,
}

/// Discovers new patents, makes their XML local and annotates every patent
/// the annotator has not marked yet.
pub struct AnnotatorJob {
    ctx: DbContext,
    discovery: PatentDiscovery,
    fetcher: XmlFetcher,
    blob_store: Arc<dyn BlobStore>,
    factory: Arc<dyn TaggerFactory>,
    annotator: AnnotatorMetadata,
    dictionary: Arc<Dictionary>,
    settings: JobSettings,
}

impl AnnotatorJob {
    /// `dictionary` must be the one returned by the dictionary guard for
    /// `annotator`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: DbContext,
        discovery: PatentDiscovery,
        fetcher: XmlFetcher,
        blob_store: Arc<dyn BlobStore>,
        factory: Arc<dyn TaggerFactory>,
        annotator: AnnotatorMetadata,
        dictionary: Arc<Dictionary>,
        settings: JobSettings,
    ) -> Self {
        Self {
            ctx,
            discovery,
            fetcher,
            blob_store,
            factory,
            annotator,
            dictionary,
            settings,
        }
    }

    pub async fn run(&self) -> Result<JobSummary, PipelineError> {
        let discovered = self.discovery.load_new_patents().await?;

        let unannotated = self.ctx.patents().list_unannotated(&self.annotator.name).await?;
        let unannotated_count = unannotated.len();
        info!("{} patents not yet annotated by {}", unannotated_count, self.annotator);

        let to_annotate = self.fetcher.ensure_local(unannotated).await?;
        let annotated = to_annotate.len();
        if to_annotate.is_empty() {
            info!("Nothing to annotate");
        } else {
            info!("Annotating {} patents with {} workers", annotated, self.settings.threads);
            self.build_pipeline(to_annotate).run().await?;
        }

        Ok(JobSummary {
            discovered,
            unannotated: unannotated_count,
            annotated,
        })
    }

    fn build_pipeline(&self, patents: Vec<PatentMetadata>) -> PipelineRunner {
        let (source_tx, annotate_rx) = channel();
        let (annotate_tx, persist_rx) = channel();

        let annotate = AnnotationStage::new(
            self.settings.threads,
            self.factory.clone(),
            self.blob_store.clone(),
        );
        let persist = PersistenceStage::new(
            self.ctx.annotations(),
            self.annotator.id,
            self.dictionary.clone(),
            self.settings.batch_size,
        );

        let mut runner = PipelineRunner::new();
        runner.add_stage(Box::new(SourceStage::new("source", patents, source_tx)));
        runner.add_stage(Box::new(Stage::new(
            "annotate",
            annotate,
            annotate_rx,
            Emitter::new(annotate_tx),
        )));
        runner.add_stage(Box::new(Stage::new(
            "persist",
            persist,
            persist_rx,
            Emitter::terminal(),
        )));
        runner
    }
}
