//! Upstream collaborators: the patent catalog, the XML source and the
//! Ensembl cross-reference source.
//!
//! The pipeline only sees these traits; `sqlite` holds the implementations
//! used by the binary.

mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PatentMetadata;
use crate::repository::DieselError;

pub use sqlite::{SqliteEnsemblSource, SqliteSourceCatalog, SqliteXmlSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream query failed: {0}")]
    Database(#[from] DieselError),

    #[error("invalid upstream record: {0}")]
    InvalidRecord(String),
}

/// Enumerates upstream patents.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Every patent of the supported authorities.
    async fn all_patents(&self) -> Result<Vec<PatentMetadata>, SourceError>;

    /// Patents published on or after `date`.
    async fn published_since(&self, date: NaiveDate) -> Result<Vec<PatentMetadata>, SourceError>;
}

/// Serves patent XML bodies.
#[async_trait]
pub trait XmlSource: Send + Sync {
    /// Bodies of the requested patents. Numbers the upstream has no body for
    /// are absent from the result.
    async fn fetch_batch(&self, patent_numbers: &[String])
        -> Result<Vec<(String, Vec<u8>)>, SourceError>;
}

/// Ensembl peptide → UniProt cross references by release.
#[async_trait]
pub trait EnsemblSource: Send + Sync {
    /// `(peptide id, uniprot accession)` pairs a release knows for the given
    /// peptide ids.
    async fn peptide_to_uniprot(
        &self,
        release: &str,
        peptide_ids: &[String],
    ) -> Result<Vec<(String, String)>, SourceError>;
}
