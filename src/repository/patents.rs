//! Patent metadata persistence and the unannotated-work query.

use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewPatent, PatentRecord};
use super::pool::{DbPool, DieselError};
use super::util::{format_date, parse_date};
use crate::models::PatentMetadata;
use crate::schema::{annotator, patent, patent_annotated_by};
use crate::with_conn;

/// Repository for the `patent` table.
#[derive(Clone)]
pub struct PatentRepository {
    pool: DbPool,
}

impl PatentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Patents sharing the most recent publication date in the store.
    ///
    /// Empty when the store has no patents.
    pub async fn most_recent(&self) -> Result<Vec<PatentMetadata>, DieselError> {
        with_conn!(self.pool, conn, {
            let latest: Option<String> = patent::table
                .select(diesel::dsl::max(patent::publication_date))
                .first(&mut conn)
                .await?;

            let Some(latest) = latest else {
                return Ok(Vec::new());
            };

            patent::table
                .filter(patent::publication_date.eq(&latest))
                .order(patent::patent_id.asc())
                .select(PatentRecord::as_select())
                .load::<PatentRecord>(&mut conn)
                .await?
                .into_iter()
                .map(PatentRecord::into_metadata)
                .collect()
        })
    }

    /// Insert patents in a single transaction, one row per statement.
    /// Returns the number of rows written.
    pub async fn save_all(&self, patents: &[PatentMetadata]) -> Result<usize, DieselError> {
        if patents.is_empty() {
            return Ok(0);
        }

        let rows: Vec<NewPatent<'_>> = patents
            .iter()
            .map(|p| NewPatent {
                patent_number: &p.patent_number,
                publication_date: format_date(p.publication_date),
            })
            .collect();

        with_conn!(self.pool, conn, {
            conn.transaction::<_, DieselError, _>(|conn| {
                let rows = &rows;
                Box::pin(async move {
                    let mut written = 0;
                    for row in rows {
                        written += diesel::insert_into(patent::table)
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

    /// Patents without an annotated-by mark for the named annotator.
    pub async fn list_unannotated(
        &self,
        annotator_name: &str,
    ) -> Result<Vec<PatentMetadata>, DieselError> {
        let annotated = patent_annotated_by::table
            .inner_join(annotator::table)
            .filter(annotator::name.eq(annotator_name.to_string()))
            .select(patent_annotated_by::patent_id);

        let records: Vec<PatentRecord> = with_conn!(self.pool, conn, {
            patent::table
                .filter(patent::patent_id.ne_all(annotated))
                .order(patent::patent_id.asc())
                .select(PatentRecord::as_select())
                .load(&mut conn)
                .await?
        });

        records.into_iter().map(PatentRecord::into_metadata).collect()
    }

    /// Look up a patent by its external number.
    pub async fn get_by_number(
        &self,
        patent_number: &str,
    ) -> Result<Option<PatentMetadata>, DieselError> {
        let record: Option<PatentRecord> = with_conn!(self.pool, conn, {
            patent::table
                .filter(patent::patent_number.eq(patent_number))
                .select(PatentRecord::as_select())
                .first(&mut conn)
                .await
                .optional()?
        });

        record.map(PatentRecord::into_metadata).transpose()
    }

    /// Every stored patent number.
    pub async fn all_numbers(&self) -> Result<HashSet<String>, DieselError> {
        let numbers: Vec<String> = with_conn!(self.pool, conn, {
            patent::table
                .select(patent::patent_number)
                .load(&mut conn)
                .await?
        });
        Ok(numbers.into_iter().collect())
    }

    pub async fn count(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            patent::table.count().get_result(&mut conn).await
        })
    }

    /// Publication date of the newest stored patent.
    pub async fn latest_publication_date(
        &self,
    ) -> Result<Option<chrono::NaiveDate>, DieselError> {
        let latest: Option<String> = with_conn!(self.pool, conn, {
            patent::table
                .select(diesel::dsl::max(patent::publication_date))
                .first(&mut conn)
                .await?
        });
        latest.as_deref().map(parse_date).transpose()
    }
}
