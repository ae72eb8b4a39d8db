//! Drug-target (IDG) list loading and the target-linked patent report.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{IdgAnnotation, IdgTarget};
use crate::repository::{DieselError, IdgRepository};

/// Column headers of the report.
pub const REPORT_HEADER: [&str; 13] = [
    "Entity",
    "UniProt",
    "Target name",
    "Development level",
    "Target family",
    "Patent",
    "Published",
    "Total hits",
    "Description hits",
    "Claims hits",
    "Abstract hits",
    "Title hits",
    "Terms",
];

#[derive(Debug, Error)]
pub enum IdgError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

/// Parse a target list export.
///
/// The first line is a header. Columns used: 1 UniProt accession, 2 name,
/// 4 development level, 5 target family. Shorter rows are skipped.
pub fn parse_targets(content: &str) -> Vec<IdgTarget> {
    content
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 6 {
                warn!(
                    "Skipping target list line {}: expected at least 6 columns, found {}",
                    i + 1,
                    columns.len()
                );
                return None;
            }
            Some(IdgTarget {
                uniprot_acc: columns[1].trim().to_string(),
                name: columns[2].trim().to_string(),
                development_level: columns[4].trim().to_string(),
                target_family: columns[5].trim().to_string(),
            })
        })
        .collect()
}

pub struct IdgService {
    repo: IdgRepository,
}

impl IdgService {
    pub fn new(repo: IdgRepository) -> Self {
        Self { repo }
    }

    /// Replace the stored target list with the one in `path`.
    pub async fn load_targets(&self, path: &Path) -> Result<usize, IdgError> {
        debug!("Loading IDG targets from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| IdgError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let targets = parse_targets(&content);

        let previous = self.repo.count().await?;
        let written = self.repo.replace_targets(&targets).await?;
        if written as i64 != previous {
            info!(
                "Loaded {} IDG targets (previously there were {})",
                written, previous
            );
        }
        Ok(written)
    }

    /// Write the target-linked annotation report. Returns the number of
    /// data rows.
    pub async fn write_report(&self, path: &Path) -> Result<usize, IdgError> {
        info!("Retrieving annotations of IDG targets");
        let annotations = self.repo.retrieve_annotations().await?;

        let io_error = |source: std::io::Error| IdgError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        write_rows(&mut writer, &annotations).map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        info!("IDG annotations written to {}", path.display());
        Ok(annotations.len())
    }
}

/// Tabs and line breaks inside a value would break the row layout.
fn cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

fn write_rows(out: &mut impl Write, annotations: &[IdgAnnotation]) -> std::io::Result<()> {
    writeln!(out, "{}", REPORT_HEADER.join("\t"))?;
    for a in annotations {
        let row = [
            cell(&a.entity_name),
            cell(&a.uniprot_acc),
            cell(&a.target_name),
            cell(&a.development_level),
            cell(&a.target_family),
            cell(&a.patent_number),
            a.publication_date.to_string(),
            a.total_hits.to_string(),
            a.description_hits.to_string(),
            a.claims_hits.to_string(),
            a.abstract_hits.to_string(),
            a.title_hits.to_string(),
            cell(&a.terms),
        ];
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}
