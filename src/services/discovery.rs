//! Watermark-based discovery of newly published patents.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::PatentMetadata;
use crate::repository::{DieselError, PatentRepository};
use crate::sources::{SourceCatalog, SourceError};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to save discovered patents: {0}")]
    Database(#[from] DieselError),
}

/// Copies new upstream patents into the store.
pub struct PatentDiscovery {
    catalog: Arc<dyn SourceCatalog>,
    patents: PatentRepository,
}

impl PatentDiscovery {
    pub fn new(catalog: Arc<dyn SourceCatalog>, patents: PatentRepository) -> Self {
        Self { catalog, patents }
    }

    /// Insert upstream patents published on or after the newest stored
    /// publication date, or every upstream patent when the store is empty.
    ///
    /// Patents of the newest stored day are requested again and filtered
    /// out, so a day that was only partially ingested is completed without
    /// duplicates. Returns the number of patents inserted.
    pub async fn load_new_patents(&self) -> Result<usize, DiscoveryError> {
        let tail = self.patents.most_recent().await?;

        let upstream = match tail.first() {
            None => {
                info!("Empty store, loading all upstream patents");
                self.catalog.all_patents().await?
            }
            Some(latest) => {
                info!(
                    "Loading patents published since {} ({} already stored that day)",
                    latest.publication_date,
                    tail.len()
                );
                self.catalog.published_since(latest.publication_date).await?
            }
        };

        let new_patents = select_new(&tail, upstream);
        debug!("{} new patents to insert", new_patents.len());

        let written = self.patents.save_all(&new_patents).await?;
        info!("Inserted {} new patents", written);
        Ok(written)
    }
}

/// Upstream patents not in the stored tail, first occurrence of each number.
fn select_new(tail: &[PatentMetadata], upstream: Vec<PatentMetadata>) -> Vec<PatentMetadata> {
    let mut seen: HashSet<String> = tail.iter().map(|p| p.patent_number.clone()).collect();
    upstream
        .into_iter()
        .filter(|p| seen.insert(p.patent_number.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    struct FakeCatalog {
        patents: Vec<PatentMetadata>,
    }

    #[async_trait]
    impl SourceCatalog for FakeCatalog {
        async fn all_patents(&self) -> Result<Vec<PatentMetadata>, SourceError> {
            Ok(self.patents.clone())
        }

        async fn published_since(
            &self,
            date: NaiveDate,
        ) -> Result<Vec<PatentMetadata>, SourceError> {
            Ok(self
                .patents
                .iter()
                .filter(|p| p.publication_date >= date)
                .cloned()
                .collect())
        }
    }

    fn patent(number: &str, y: i32, m: u32, d: u32) -> PatentMetadata {
        PatentMetadata::new(number, NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[tokio::test]
    async fn test_watermark_does_not_duplicate_tail_day() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        ctx.patents()
            .save_all(&[patent("US-1-A1", 2020, 6, 1)])
            .await
            .unwrap();

        let catalog = Arc::new(FakeCatalog {
            patents: vec![
                patent("US-1-A1", 2020, 6, 1),
                patent("US-2-A1", 2020, 6, 1),
                patent("US-3-A1", 2020, 7, 1),
            ],
        });
        let discovery = PatentDiscovery::new(catalog, ctx.patents());

        assert_eq!(discovery.load_new_patents().await.unwrap(), 2);
        assert_eq!(ctx.patents().count().await.unwrap(), 3);

        // Nothing new upstream
        assert_eq!(discovery.load_new_patents().await.unwrap(), 0);
        assert_eq!(ctx.patents().count().await.unwrap(), 3);
    }

    #[test]
    fn test_select_new_drops_upstream_duplicates() {
        let tail = vec![patent("EP-1-A1", 2020, 1, 1)];
        let upstream = vec![
            patent("EP-1-A1", 2020, 1, 1),
            patent("EP-2-A1", 2020, 1, 2),
            patent("EP-2-A1", 2020, 1, 2),
        ];
        let new: Vec<_> = select_new(&tail, upstream)
            .into_iter()
            .map(|p| p.patent_number)
            .collect();
        assert_eq!(new, vec!["EP-2-A1"]);
    }
}
