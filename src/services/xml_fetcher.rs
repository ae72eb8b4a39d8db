//! Bulk XML download into the blob store.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::PatentMetadata;
use crate::sources::{SourceError, XmlSource};
use crate::storage::{BlobStore, StorageError};

/// Patent numbers per upstream request.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Upstream bind-parameter ceiling for one request.
pub const MAX_CHUNK_SIZE: usize = 1664;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Pulls patent XML from an upstream source in bounded chunks and mirrors it
/// into the blob store.
#[derive(Clone)]
pub struct XmlFetcher {
    source: Arc<dyn XmlSource>,
    blob_store: Arc<dyn BlobStore>,
    chunk_size: usize,
}

impl XmlFetcher {
    pub fn new(source: Arc<dyn XmlSource>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            source,
            blob_store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size, clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Stream `(number, body)` for every requested number, in request order.
    /// `None` means the upstream has no body for that patent.
    pub fn fetch(
        &self,
        patent_numbers: Vec<String>,
    ) -> impl Stream<Item = Result<(String, Option<Vec<u8>>), SourceError>> + '_ {
        let chunks: Vec<Vec<String>> = patent_numbers
            .chunks(self.chunk_size)
            .map(<[String]>::to_vec)
            .collect();

        stream::iter(chunks)
            .then(move |chunk| async move {
                let mut bodies: HashMap<String, Vec<u8>> =
                    self.source.fetch_batch(&chunk).await?.into_iter().collect();
                let filled: Vec<_> = chunk
                    .into_iter()
                    .map(|number| {
                        let body = bodies.remove(&number);
                        (number, body)
                    })
                    .collect();
                Ok::<_, SourceError>(stream::iter(filled.into_iter().map(Ok)))
            })
            .try_flatten()
    }

    /// Make sure the XML of every patent is in the blob store.
    ///
    /// Returns the patents already stored followed by those downloaded now.
    /// Patents the upstream has no XML for are left out and retried on a
    /// later run. The first write failure aborts the whole call.
    pub async fn ensure_local(
        &self,
        patents: Vec<PatentMetadata>,
    ) -> Result<Vec<PatentMetadata>, FetchError> {
        let (mut local, missing): (Vec<_>, Vec<_>) = patents
            .into_iter()
            .partition(|p| self.blob_store.exists(&p.patent_number));

        debug!("{} patents already stored, {} to download", local.len(), missing.len());
        if missing.is_empty() {
            return Ok(local);
        }

        info!("Downloading {} patents", missing.len());
        let numbers: Vec<String> = missing.iter().map(|p| p.patent_number.clone()).collect();
        let mut by_number: HashMap<String, PatentMetadata> = missing
            .into_iter()
            .map(|p| (p.patent_number.clone(), p))
            .collect();

        let mut downloaded = 0usize;
        let mut without_xml = 0usize;
        let mut bodies = std::pin::pin!(self.fetch(numbers));
        while let Some((number, body)) = bodies.try_next().await? {
            let Some(xml) = body else {
                debug!(patent = %number, "No XML upstream, skipping");
                without_xml += 1;
                continue;
            };

            self.blob_store.write(&number, &xml)?;
            if let Some(patent) = by_number.remove(&number) {
                local.push(patent);
            }
            downloaded += 1;
            if downloaded % 100 == 0 {
                debug!("Downloaded {} patents", downloaded);
            }
        }

        info!("Downloaded {} patents", downloaded);
        if without_xml > 0 {
            warn!(
                "{} patents have no XML upstream; they will be retried on the next run",
                without_xml
            );
        }
        Ok(local)
    }
}
