//! Dictionary identity check between the tagger's vocabulary and the store.
//!
//! Every stored annotation references a `bio_entity` row, so the persisted
//! vocabulary is written once and never changed afterwards. A tagger whose
//! dictionary differs from the stored one must not run.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::annotator::{DictionaryReader, TaggerError};
use crate::models::{AnnotatorMetadata, Dictionary, DictionaryEntry};
use crate::repository::{DictionaryRepository, DictionarySaveError, DieselError};

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error(transparent)]
    Save(#[from] DictionarySaveError),

    #[error(
        "dictionary of annotator {annotator} does not match the store: {stored} stored, {on_disk} on disk, {missing} on-disk entries not stored"
    )]
    Mismatch {
        annotator: String,
        stored: usize,
        on_disk: usize,
        missing: usize,
    },

    #[error("failed to read the tagger dictionary: {0}")]
    Read(#[from] TaggerError),

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

pub struct DictionaryGuard {
    repo: DictionaryRepository,
}

impl DictionaryGuard {
    pub fn new(repo: DictionaryRepository) -> Self {
        Self { repo }
    }

    /// Import the on-disk dictionary on first use, or check that it equals
    /// the stored one. Returns the stored dictionary.
    pub async fn verify(
        &self,
        annotator: &AnnotatorMetadata,
        reader: &dyn DictionaryReader,
    ) -> Result<Dictionary, DictionaryError> {
        let stored = self.repo.get(annotator).await?;
        let on_disk: BTreeSet<DictionaryEntry> = reader.read()?.into_iter().collect();
        debug!(
            "Dictionary of {}: {} stored, {} on disk",
            annotator,
            stored.len(),
            on_disk.len()
        );

        if stored.is_empty() {
            let written = self.repo.save(annotator, &on_disk).await?;
            info!("Imported {} dictionary entities for {}", written, annotator);
            return Ok(self.repo.get(annotator).await?);
        }

        check_identity(annotator, &stored, &on_disk)?;
        info!("Dictionary of {} matches the store ({} entities)", annotator, stored.len());
        Ok(stored)
    }
}

fn check_identity(
    annotator: &AnnotatorMetadata,
    stored: &Dictionary,
    on_disk: &BTreeSet<DictionaryEntry>,
) -> Result<(), DictionaryError> {
    let missing = on_disk
        .iter()
        .filter(|e| stored.lookup(&e.entity_type, &e.name).is_none())
        .count();

    if stored.len() != on_disk.len() || missing > 0 {
        error!(
            "Dictionary mismatch for {}: {} stored, {} on disk, {} missing",
            annotator,
            stored.len(),
            on_disk.len(),
            missing
        );
        return Err(DictionaryError::Mismatch {
            annotator: annotator.name.clone(),
            stored: stored.len(),
            on_disk: on_disk.len(),
            missing,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    struct StaticReader(Vec<DictionaryEntry>);

    impl DictionaryReader for StaticReader {
        fn read(&self) -> Result<Vec<DictionaryEntry>, TaggerError> {
            Ok(self.0.clone())
        }
    }

    fn gene(name: &str) -> DictionaryEntry {
        DictionaryEntry::new("HUMAN_GENE", name)
    }

    #[tokio::test]
    async fn test_first_run_imports_then_accepts_same_dictionary() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        let annotator = ctx.annotators().get_or_create("tagger").await.unwrap();
        let guard = DictionaryGuard::new(ctx.dictionary());

        let reader = StaticReader(vec![gene("ENSP1"), gene("ENSP2"), gene("ENSP1")]);
        let dictionary = guard.verify(&annotator, &reader).await.unwrap();
        assert_eq!(dictionary.len(), 2);
        assert!(dictionary.lookup("HUMAN_GENE", "ENSP2").is_some());

        let again = guard.verify(&annotator, &reader).await.unwrap();
        assert_eq!(
            again.lookup("HUMAN_GENE", "ENSP1"),
            dictionary.lookup("HUMAN_GENE", "ENSP1")
        );
    }

    #[tokio::test]
    async fn test_drift_is_rejected() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        let annotator = ctx.annotators().get_or_create("tagger").await.unwrap();
        let guard = DictionaryGuard::new(ctx.dictionary());

        guard
            .verify(&annotator, &StaticReader(vec![gene("ENSP1")]))
            .await
            .unwrap();

        let renamed = guard
            .verify(&annotator, &StaticReader(vec![gene("ENSP2")]))
            .await;
        assert!(matches!(
            renamed,
            Err(DictionaryError::Mismatch { missing: 1, .. })
        ));

        let grown = guard
            .verify(&annotator, &StaticReader(vec![gene("ENSP1"), gene("ENSP2")]))
            .await;
        assert!(matches!(
            grown,
            Err(DictionaryError::Mismatch {
                stored: 1,
                on_disk: 2,
                ..
            })
        ));

        assert_eq!(ctx.dictionary().get(&annotator).await.unwrap().len(), 1);
    }
}
