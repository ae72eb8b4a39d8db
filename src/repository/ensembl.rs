//! Stored Ensembl peptide → UniProt mapping.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::PeptideMappingRecord;
use super::pool::{DbPool, DieselError};
use crate::models::PeptideMapping;
use crate::schema::ensembl_peptide_to_uniprot;
use crate::with_conn;

#[derive(Clone)]
pub struct EnsemblRepository {
    pool: DbPool,
}

impl EnsemblRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Newest release present in the stored mapping.
    ///
    /// Releases are compared numerically when they parse as integers, so
    /// `100` is newer than `99`.
    pub async fn latest_release(&self) -> Result<Option<String>, DieselError> {
        let releases: Vec<String> = with_conn!(self.pool, conn, {
            ensembl_peptide_to_uniprot::table
                .select(ensembl_peptide_to_uniprot::ensembl_release)
                .distinct()
                .load(&mut conn)
                .await?
        });
        Ok(releases.into_iter().max_by(|a, b| compare_releases(a, b)))
    }

    /// Replace the stored mapping in one transaction.
    pub async fn replace(&self, mappings: &[PeptideMapping]) -> Result<usize, DieselError> {
        let records: Vec<PeptideMappingRecord> = mappings
            .iter()
            .map(|m| PeptideMappingRecord {
                ensembl_peptide_id: m.ensembl_peptide_id.clone(),
                uniprot_acc: m.uniprot_acc.clone(),
                ensembl_release: m.ensembl_release.clone(),
            })
            .collect();

        with_conn!(self.pool, conn, {
            conn.transaction::<_, DieselError, _>(|conn| {
                let records = &records;
                Box::pin(async move {
                    diesel::delete(ensembl_peptide_to_uniprot::table)
                        .execute(conn)
                        .await?;
                    let mut written = 0;
                    for row in records {
                        written += diesel::insert_into(ensembl_peptide_to_uniprot::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    Ok(written)
                })
            })
            .await
        })
    }

    pub async fn mappings(&self) -> Result<Vec<PeptideMapping>, DieselError> {
        let records: Vec<PeptideMappingRecord> = with_conn!(self.pool, conn, {
            ensembl_peptide_to_uniprot::table
                .order((
                    ensembl_peptide_to_uniprot::ensembl_peptide_id.asc(),
                    ensembl_peptide_to_uniprot::uniprot_acc.asc(),
                ))
                .select(PeptideMappingRecord::as_select())
                .load(&mut conn)
                .await?
        });
        Ok(records.into_iter().map(PeptideMapping::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            ensembl_peptide_to_uniprot::table
                .count()
                .get_result(&mut conn)
                .await
        })
    }
}

/// Order release labels numerically, falling back to text order.
pub fn compare_releases(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
