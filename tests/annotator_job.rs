//! End-to-end annotation runs against a temporary store.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::{tempdir, TempDir};

use patent_annotator::annotator::{DictionaryReader, Tagger, TaggerError, TaggerFactory};
use patent_annotator::jobs::{AnnotatorJob, JobSettings, JobSummary};
use patent_annotator::models::{DictionaryEntry, PatentMetadata, Tag};
use patent_annotator::pipeline::PipelineError;
use patent_annotator::repository::DbContext;
use patent_annotator::services::{DictionaryError, DictionaryGuard, PatentDiscovery, XmlFetcher};
use patent_annotator::sources::{SourceCatalog, SourceError, XmlSource};
use patent_annotator::storage::{BlobStore, LocalBlobStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn abstract_xml(number: &str, text: &str) -> Vec<u8> {
    format!(
        r#"<patent-document ucid="{}" lang="EN"><abstract lang="EN"><p>{}</p></abstract></patent-document>"#,
        number, text
    )
    .into_bytes()
}

/// Upstream catalog and XML store in memory.
#[derive(Default)]
struct Upstream {
    patents: Vec<(PatentMetadata, Option<Vec<u8>>)>,
}

impl Upstream {
    fn with(mut self, number: &str, published: NaiveDate, xml: Option<Vec<u8>>) -> Self {
        self.patents.push((PatentMetadata::new(number, published), xml));
        self
    }
}

#[async_trait]
impl SourceCatalog for Upstream {
    async fn all_patents(&self) -> Result<Vec<PatentMetadata>, SourceError> {
        Ok(self.patents.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn published_since(&self, since: NaiveDate) -> Result<Vec<PatentMetadata>, SourceError> {
        Ok(self
            .patents
            .iter()
            .filter(|(p, _)| p.publication_date >= since)
            .map(|(p, _)| p.clone())
            .collect())
    }
}

#[async_trait]
impl XmlSource for Upstream {
    async fn fetch_batch(&self, numbers: &[String]) -> Result<Vec<(String, Vec<u8>)>, SourceError> {
        Ok(self
            .patents
            .iter()
            .filter(|(p, _)| numbers.contains(&p.patent_number))
            .filter_map(|(p, xml)| xml.clone().map(|xml| (p.patent_number.clone(), xml)))
            .collect())
    }
}

/// Tags every abstract with a fixed list of tags.
struct ScriptedTagger {
    tags: Vec<Tag>,
}

impl Tagger for ScriptedTagger {
    fn annotate(&mut self, text: &str) -> Result<Vec<Tag>, TaggerError> {
        if text.starts_with("<abstract") {
            Ok(self.tags.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

struct ScriptedDictionary(Vec<DictionaryEntry>);

impl DictionaryReader for ScriptedDictionary {
    fn read(&self) -> Result<Vec<DictionaryEntry>, TaggerError> {
        Ok(self.0.clone())
    }
}

struct ScriptedFactory {
    dictionary: Vec<DictionaryEntry>,
    tags: Mutex<Vec<Tag>>,
}

impl ScriptedFactory {
    fn new(names: &[&str], tags: Vec<Tag>) -> Arc<Self> {
        Arc::new(Self {
            dictionary: names
                .iter()
                .map(|name| DictionaryEntry::new("HUMAN_GENE", *name))
                .collect(),
            tags: Mutex::new(tags),
        })
    }
}

impl TaggerFactory for ScriptedFactory {
    fn annotator_name(&self) -> &str {
        "tagger"
    }

    fn create_tagger(&self) -> Result<Box<dyn Tagger>, TaggerError> {
        let tags = self.tags.lock().unwrap().clone();
        Ok(Box::new(ScriptedTagger { tags }))
    }

    fn dictionary_reader(&self) -> Box<dyn DictionaryReader + '_> {
        Box::new(ScriptedDictionary(self.dictionary.clone()))
    }
}

fn gene(term: &str) -> Tag {
    Tag::new("HUMAN_GENE", "ENSP00000001", term, 0, term.len() - 1)
}

struct Harness {
    _dir: TempDir,
    db_path: PathBuf,
    ctx: DbContext,
    blob_store: Arc<LocalBlobStore>,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let ctx = DbContext::open(&db_path).await.unwrap();
        let blob_store = Arc::new(LocalBlobStore::new(dir.path().join("xml")));
        Self {
            _dir: dir,
            db_path,
            ctx,
            blob_store,
        }
    }

    /// Dictionary guard, then one job run, the way `run` wires them.
    async fn run(
        &self,
        upstream: &Arc<Upstream>,
        factory: &Arc<ScriptedFactory>,
    ) -> Result<JobSummary, PipelineError> {
        let annotator = self.ctx.annotators().get_or_create(factory.annotator_name()).await?;
        let reader = factory.dictionary_reader();
        let dictionary = DictionaryGuard::new(self.ctx.dictionary())
            .verify(&annotator, reader.as_ref())
            .await?;

        let blob_store: Arc<dyn BlobStore> = self.blob_store.clone();
        let job = AnnotatorJob::new(
            self.ctx.clone(),
            PatentDiscovery::new(upstream.clone(), self.ctx.patents()),
            XmlFetcher::new(upstream.clone(), blob_store.clone()),
            blob_store,
            factory.clone(),
            annotator,
            Arc::new(dictionary),
            JobSettings {
                threads: 2,
                batch_size: 92,
            },
        );
        job.run().await
    }

    async fn patent_id(&self, number: &str) -> i32 {
        self.ctx.patents().get_by_number(number).await.unwrap().unwrap().id
    }

    async fn counts(&self) -> (i64, i64, i64, i64) {
        let tagger = self.ctx.annotators().get("tagger").await.unwrap().unwrap();
        (
            self.ctx.patents().count().await.unwrap(),
            self.ctx.annotations().count_annotations().await.unwrap(),
            self.ctx.annotations().count_frequencies().await.unwrap(),
            self.ctx.annotations().count_marks(tagger.id).await.unwrap(),
        )
    }

    fn sqlite(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.db_path).unwrap()
    }
}

fn single_patent() -> Arc<Upstream> {
    Arc::new(Upstream::default().with(
        "EP-1-A1",
        date(2020, 1, 1),
        Some(abstract_xml("EP-1-A1", "ENSP00000001 is mentioned")),
    ))
}

#[tokio::test]
async fn test_empty_store_single_patent_single_annotation() {
    let harness = Harness::new().await;
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene("ENSP00000001")]);

    let summary = harness.run(&single_patent(), &factory).await.unwrap();
    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.annotated, 1);
    assert_eq!(harness.counts().await, (1, 1, 1, 1));

    let tagger = harness.ctx.annotators().get("tagger").await.unwrap().unwrap();
    assert_eq!(harness.ctx.dictionary().get(&tagger).await.unwrap().len(), 1);

    let patent_id = harness.patent_id("EP-1-A1").await;
    let annotations = harness.ctx.annotations().annotations_for(patent_id).await.unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].field_id, 3);
    assert_eq!(annotations[0].rank, 0);
    assert_eq!((annotations[0].start_offset, annotations[0].end_offset), (0, 11));
    assert_eq!(annotations[0].term, "ENSP00000001");

    let frequencies = harness.ctx.annotations().frequencies_for(patent_id).await.unwrap();
    assert_eq!(frequencies.len(), 1);
    assert_eq!(frequencies[0].frequency, 1);

    assert!(harness.ctx.patents().list_unannotated("tagger").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_term_is_dropped_but_patent_is_marked() {
    let harness = Harness::new().await;
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene(&"x".repeat(200))]);

    harness.run(&single_patent(), &factory).await.unwrap();
    assert_eq!(harness.counts().await, (1, 0, 0, 1));
}

#[tokio::test]
async fn test_case_and_trailing_whitespace_collapse_into_one_frequency() {
    let harness = Harness::new().await;
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene("Foo"), gene("foo ")]);

    harness.run(&single_patent(), &factory).await.unwrap();
    assert_eq!(harness.counts().await, (1, 2, 1, 1));

    let patent_id = harness.patent_id("EP-1-A1").await;
    let frequencies = harness.ctx.annotations().frequencies_for(patent_id).await.unwrap();
    assert_eq!(frequencies[0].frequency, 2);
    assert_eq!(frequencies[0].term.to_lowercase().trim_end(), "foo");
}

#[tokio::test]
async fn test_failed_commit_leaves_patent_pending_and_rerun_matches_clean_run() {
    let harness = Harness::new().await;
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene("ENSP00000001")]);
    let upstream = single_patent();

    harness
        .sqlite()
        .execute_batch(
            "CREATE TRIGGER fail_marks BEFORE INSERT ON patent_annotated_by
             BEGIN SELECT RAISE(ABORT, 'injected'); END;",
        )
        .unwrap();

    let err = harness.run(&upstream, &factory).await.unwrap_err();
    assert!(matches!(err, PipelineError::Database(_)), "{:?}", err);
    // Discovery committed on its own; the batch rolled back entirely
    assert_eq!(harness.counts().await, (1, 0, 0, 0));
    assert_eq!(harness.ctx.patents().list_unannotated("tagger").await.unwrap().len(), 1);

    harness.sqlite().execute_batch("DROP TRIGGER fail_marks;").unwrap();

    let summary = harness.run(&upstream, &factory).await.unwrap();
    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.annotated, 1);
    assert_eq!(harness.counts().await, (1, 1, 1, 1));
}

#[tokio::test]
async fn test_discovery_watermark_and_idempotent_rerun() {
    let harness = Harness::new().await;
    harness
        .ctx
        .patents()
        .save_all(&[PatentMetadata::new("US-1-A1", date(2020, 6, 1))])
        .await
        .unwrap();

    let upstream = Arc::new(
        Upstream::default()
            .with("US-1-A1", date(2020, 6, 1), Some(abstract_xml("US-1-A1", "one")))
            .with("US-2-A1", date(2020, 6, 1), Some(abstract_xml("US-2-A1", "two")))
            .with("US-3-A1", date(2020, 7, 1), Some(abstract_xml("US-3-A1", "three"))),
    );
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene("ENSP00000001")]);

    let summary = harness.run(&upstream, &factory).await.unwrap();
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.annotated, 3);

    let numbers = harness.ctx.patents().all_numbers().await.unwrap();
    let expected: HashSet<String> = ["US-1-A1", "US-2-A1", "US-3-A1"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(numbers, expected);
    assert_eq!(harness.counts().await, (3, 3, 3, 3));

    let summary = harness.run(&upstream, &factory).await.unwrap();
    assert_eq!(summary, JobSummary::default());
    assert_eq!(harness.counts().await, (3, 3, 3, 3));
}

#[tokio::test]
async fn test_dictionary_drift_aborts_before_any_write() {
    let harness = Harness::new().await;
    let initial = ScriptedFactory::new(&["ENSP00000001"], Vec::new());
    let tagger = harness.ctx.annotators().get_or_create("tagger").await.unwrap();
    let reader = initial.dictionary_reader();
    DictionaryGuard::new(harness.ctx.dictionary())
        .verify(&tagger, reader.as_ref())
        .await
        .unwrap();

    let drifted = ScriptedFactory::new(&["ENSP00000002"], Vec::new());
    let err = harness.run(&single_patent(), &drifted).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Dictionary(DictionaryError::Mismatch { .. })
    ));
    assert_eq!(harness.counts().await, (0, 0, 0, 0));
    assert_eq!(harness.ctx.dictionary().get(&tagger).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_patent_without_upstream_xml_stays_pending() {
    let harness = Harness::new().await;
    let upstream = Arc::new(
        Upstream::default()
            .with("EP-1-A1", date(2020, 1, 1), Some(abstract_xml("EP-1-A1", "one")))
            .with("EP-2-A1", date(2020, 1, 1), None),
    );
    let factory = ScriptedFactory::new(&["ENSP00000001"], Vec::new());

    let summary = harness.run(&upstream, &factory).await.unwrap();
    assert_eq!(summary.unannotated, 2);
    assert_eq!(summary.annotated, 1);

    let pending = harness.ctx.patents().list_unannotated("tagger").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].patent_number, "EP-2-A1");
    assert!(!harness.blob_store.exists("EP-2-A1"));
}

#[tokio::test]
async fn test_many_patents_span_several_batches() {
    let harness = Harness::new().await;
    let mut upstream = Upstream::default();
    for n in 0..200 {
        let number = format!("WO-{}-A1", 2_000_000 + n);
        let xml = abstract_xml(&number, "ENSP00000001");
        upstream = upstream.with(&number, date(2021, 3, 4), Some(xml));
    }
    let factory = ScriptedFactory::new(&["ENSP00000001"], vec![gene("ENSP00000001")]);

    let summary = harness.run(&Arc::new(upstream), &factory).await.unwrap();
    assert_eq!(summary.annotated, 200);
    assert_eq!(harness.counts().await, (200, 200, 200, 200));
}
