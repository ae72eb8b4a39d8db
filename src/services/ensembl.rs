//! Ensembl peptide → UniProt mapping maintenance.
//!
//! The tagger's gene vocabulary uses Ensembl peptide ids while drug targets
//! are keyed by UniProt accession. The mapping is rebuilt whenever a newer
//! Ensembl release is configured.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Dictionary, PeptideMapping};
use crate::repository::{DieselError, EnsemblRepository};
use crate::sources::{EnsemblSource, SourceError};

/// Entity type carrying Ensembl peptide ids.
pub const HUMAN_GENE: &str = "HUMAN_GENE";

#[derive(Debug, Error)]
pub enum EnsemblError {
    #[error("no Ensembl releases configured (ensembl.releases)")]
    NoReleases,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

/// Split a comma-separated release list, newest first.
pub fn parse_releases(releases: &str) -> Result<Vec<String>, EnsemblError> {
    let parsed: Vec<String> = releases
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if parsed.is_empty() {
        return Err(EnsemblError::NoReleases);
    }
    Ok(parsed)
}

/// Peptide ids of a dictionary: its `HUMAN_GENE` names starting with `ENSP`.
pub fn peptide_ids(dictionary: &Dictionary) -> BTreeSet<String> {
    dictionary
        .names_of_type(HUMAN_GENE)
        .filter(|name| name.starts_with("ENSP"))
        .map(str::to_string)
        .collect()
}

pub struct EnsemblMapper {
    source: Arc<dyn EnsemblSource>,
    repo: EnsemblRepository,
    releases: Vec<String>,
}

impl EnsemblMapper {
    pub fn new(
        source: Arc<dyn EnsemblSource>,
        repo: EnsemblRepository,
        releases: &str,
    ) -> Result<Self, EnsemblError> {
        Ok(Self {
            source,
            repo,
            releases: parse_releases(releases)?,
        })
    }

    fn newest_release(&self) -> &str {
        &self.releases[0]
    }

    /// Whether the stored mapping predates the newest configured release.
    pub async fn needs_update(&self) -> Result<bool, EnsemblError> {
        let stored = self.repo.latest_release().await?;
        debug!(
            "Newest configured Ensembl release {}, stored {:?}",
            self.newest_release(),
            stored
        );
        Ok(stored.as_deref() != Some(self.newest_release()))
    }

    /// Rebuild and replace the stored mapping. Returns the number of
    /// mappings saved.
    pub async fn update_mapping(&self, peptide_ids: &BTreeSet<String>) -> Result<usize, EnsemblError> {
        info!(
            "Updating the Ensembl peptide to UniProt mapping for release {}",
            self.newest_release()
        );

        let mapping = self.map_to_uniprot(peptide_ids).await?;
        let written = self.repo.replace(&mapping).await?;

        let mapped: HashSet<&str> = mapping
            .iter()
            .map(|m| m.ensembl_peptide_id.as_str())
            .collect();
        info!(
            "Mapped {} Ensembl peptide ids to UniProt accessions; {} ids were not mapped",
            written,
            peptide_ids.len().saturating_sub(mapped.len())
        );
        Ok(written)
    }

    /// Try each release, newest first, on the ids still unmapped. Mappings
    /// to accessions already claimed by a newer release are dropped.
    async fn map_to_uniprot(
        &self,
        peptide_ids: &BTreeSet<String>,
    ) -> Result<Vec<PeptideMapping>, EnsemblError> {
        let mut remaining: BTreeSet<String> = peptide_ids.clone();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut mapping = Vec::new();

        for release in &self.releases {
            if remaining.is_empty() {
                break;
            }

            let ids: Vec<String> = remaining.iter().cloned().collect();
            let pairs = self.source.peptide_to_uniprot(release, &ids).await?;

            let mut release_claims = Vec::new();
            for (peptide, uniprot) in &pairs {
                remaining.remove(peptide);
                if !claimed.contains(uniprot) {
                    release_claims.push(uniprot.clone());
                    mapping.push(PeptideMapping {
                        ensembl_peptide_id: peptide.clone(),
                        uniprot_acc: uniprot.clone(),
                        ensembl_release: release.clone(),
                    });
                }
            }
            let kept = release_claims.len();
            claimed.extend(release_claims);

            debug!(
                "Mapped {} Ensembl peptide ids in release {}; {} left",
                kept,
                release,
                remaining.len()
            );
        }

        Ok(mapping)
    }
}
