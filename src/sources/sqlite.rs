//! SQLite-backed upstream sources.

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::{EnsemblSource, SourceCatalog, SourceError, XmlSource};
use crate::models::PatentMetadata;
use crate::repository::util::{format_date, parse_date, QUERY_CHUNK_SIZE};
use crate::repository::DbPool;

mod upstream {
    diesel::table! {
        patents (patent_number) {
            patent_number -> Text,
            publication_date -> Text,
        }
    }

    diesel::table! {
        patent_xml (patent_number) {
            patent_number -> Text,
            content -> Binary,
        }
    }

    diesel::table! {
        ensembl_xref (ensembl_release, ensembl_peptide_id, uniprot_acc) {
            ensembl_release -> Text,
            ensembl_peptide_id -> Text,
            uniprot_acc -> Text,
        }
    }
}

use upstream::{ensembl_xref, patent_xml, patents};

/// Authorities whose patents are annotated.
const AUTHORITIES: [&str; 3] = ["EP", "WO", "US"];

fn into_metadata(rows: Vec<(String, String)>) -> Result<Vec<PatentMetadata>, SourceError> {
    rows.into_iter()
        .map(|(number, date)| {
            let date = parse_date(&date)
                .map_err(|_| SourceError::InvalidRecord(format!("{}: bad date {}", number, date)))?;
            Ok(PatentMetadata::new(number, date))
        })
        .collect()
}

/// Patent catalog over a `patents(patent_number, publication_date)` table.
#[derive(Clone)]
pub struct SqliteSourceCatalog {
    pool: DbPool,
}

impl SqliteSourceCatalog {
    pub fn new(url: &str) -> Self {
        Self {
            pool: DbPool::new(url),
        }
    }
}

#[async_trait]
impl SourceCatalog for SqliteSourceCatalog {
    async fn all_patents(&self) -> Result<Vec<PatentMetadata>, SourceError> {
        let mut conn = self.pool.get().await?;
        let [ep, wo, us] = AUTHORITIES.map(|a| format!("{}-%", a));
        let rows: Vec<(String, String)> = patents::table
            .filter(
                patents::patent_number
                    .like(ep)
                    .or(patents::patent_number.like(wo))
                    .or(patents::patent_number.like(us)),
            )
            .order((patents::publication_date.asc(), patents::patent_number.asc()))
            .select((patents::patent_number, patents::publication_date))
            .load(&mut conn)
            .await?;
        into_metadata(rows)
    }

    async fn published_since(&self, date: NaiveDate) -> Result<Vec<PatentMetadata>, SourceError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<(String, String)> = patents::table
            .filter(patents::publication_date.ge(format_date(date)))
            .order((patents::publication_date.asc(), patents::patent_number.asc()))
            .select((patents::patent_number, patents::publication_date))
            .load(&mut conn)
            .await?;
        into_metadata(rows)
    }
}

/// XML bodies from a `patent_xml(patent_number, content)` table.
#[derive(Clone)]
pub struct SqliteXmlSource {
    pool: DbPool,
}

impl SqliteXmlSource {
    pub fn new(url: &str) -> Self {
        Self {
            pool: DbPool::new(url),
        }
    }
}

#[async_trait]
impl XmlSource for SqliteXmlSource {
    async fn fetch_batch(
        &self,
        patent_numbers: &[String],
    ) -> Result<Vec<(String, Vec<u8>)>, SourceError> {
        let mut conn = self.pool.get().await?;
        let rows = patent_xml::table
            .filter(patent_xml::patent_number.eq_any(patent_numbers))
            .select((patent_xml::patent_number, patent_xml::content))
            .load(&mut conn)
            .await?;
        Ok(rows)
    }
}

/// Cross references from an `ensembl_xref` table.
#[derive(Clone)]
pub struct SqliteEnsemblSource {
    pool: DbPool,
}

impl SqliteEnsemblSource {
    pub fn new(url: &str) -> Self {
        Self {
            pool: DbPool::new(url),
        }
    }
}

#[async_trait]
impl EnsemblSource for SqliteEnsemblSource {
    async fn peptide_to_uniprot(
        &self,
        release: &str,
        peptide_ids: &[String],
    ) -> Result<Vec<(String, String)>, SourceError> {
        let mut conn = self.pool.get().await?;
        let mut pairs = Vec::new();
        for chunk in peptide_ids.chunks(QUERY_CHUNK_SIZE) {
            let rows: Vec<(String, String)> = ensembl_xref::table
                .filter(ensembl_xref::ensembl_release.eq(release))
                .filter(ensembl_xref::ensembl_peptide_id.eq_any(chunk))
                .select((ensembl_xref::ensembl_peptide_id, ensembl_xref::uniprot_acc))
                .load(&mut conn)
                .await?;
            pairs.extend(rows);
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel_async::SimpleAsyncConnection;
    use tempfile::tempdir;

    async fn upstream(path: &std::path::Path) -> String {
        let url = path.display().to_string();
        let mut conn = DbPool::new(&url).get().await.unwrap();
        conn.batch_execute(
            "CREATE TABLE patents (patent_number TEXT PRIMARY KEY, publication_date TEXT);
             CREATE TABLE patent_xml (patent_number TEXT PRIMARY KEY, content BLOB);
             CREATE TABLE ensembl_xref (ensembl_release TEXT, ensembl_peptide_id TEXT, uniprot_acc TEXT);
             INSERT INTO patents VALUES
                ('US-1-A1', '2020-06-01'), ('JP-9-A', '2020-06-02'), ('EP-2-B1', '2020-07-01');
             INSERT INTO patent_xml VALUES ('US-1-A1', X'3C612F3E');
             INSERT INTO ensembl_xref VALUES ('87', 'ENSP1', 'P1'), ('86', 'ENSP1', 'P9');",
        )
        .await
        .unwrap();
        url
    }

    #[tokio::test]
    async fn test_catalog_filters_authority_and_date() {
        let dir = tempdir().unwrap();
        let url = upstream(&dir.path().join("upstream.db")).await;
        let catalog = SqliteSourceCatalog::new(&url);

        let all: Vec<_> = catalog
            .all_patents()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.patent_number)
            .collect();
        assert_eq!(all, vec!["US-1-A1", "EP-2-B1"]);

        let since = catalog
            .published_since(NaiveDate::from_ymd_opt(2020, 6, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(since[0].patent_number, "JP-9-A");
    }

    #[tokio::test]
    async fn test_xml_and_ensembl_sources() {
        let dir = tempdir().unwrap();
        let url = upstream(&dir.path().join("upstream.db")).await;

        let xml = SqliteXmlSource::new(&url)
            .fetch_batch(&["US-1-A1".to_string(), "EP-2-B1".to_string()])
            .await
            .unwrap();
        assert_eq!(xml, vec![("US-1-A1".to_string(), b"<a/>".to_vec())]);

        let pairs = SqliteEnsemblSource::new(&url)
            .peptide_to_uniprot("87", &["ENSP1".to_string()])
            .await
            .unwrap();
        assert_eq!(pairs, vec![("ENSP1".to_string(), "P1".to_string())]);
    }
}
