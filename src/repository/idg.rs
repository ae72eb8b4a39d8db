//! Drug-target list and the target-linked annotation report query.

use std::collections::{BTreeMap, HashMap};

use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::IdgTargetRecord;
use super::pool::{DbPool, DieselError};
use super::util::parse_date;
use crate::models::{Field, IdgAnnotation, IdgTarget};
use crate::schema::idg_target;
use crate::with_conn;

/// Frequency rows of target-linked entities, one per (entity, target,
/// patent, field, term).
const IDG_HITS_QUERY: &str = r#"
SELECT ie.entity_name, ie.uniprot_acc, ie.target_name, ie.development_level,
       ie.target_family, p.patent_number, p.publication_date,
       c.field_id, c.term, c.frequency
  FROM bioentity_patent_annotation_count c
  JOIN idg_entity ie ON ie.bio_entity_id = c.bio_entity_id
  JOIN patent p ON p.patent_id = c.patent_id
 ORDER BY ie.entity_name, ie.uniprot_acc, p.patent_number
"#;

#[derive(QueryableByName, Debug, Clone)]
pub struct IdgHitRow {
    #[diesel(sql_type = Text)]
    pub entity_name: String,
    #[diesel(sql_type = Text)]
    pub uniprot_acc: String,
    #[diesel(sql_type = Text)]
    pub target_name: String,
    #[diesel(sql_type = Text)]
    pub development_level: String,
    #[diesel(sql_type = Text)]
    pub target_family: String,
    #[diesel(sql_type = Text)]
    pub patent_number: String,
    #[diesel(sql_type = Text)]
    pub publication_date: String,
    #[diesel(sql_type = Integer)]
    pub field_id: i32,
    #[diesel(sql_type = Text)]
    pub term: String,
    #[diesel(sql_type = Integer)]
    pub frequency: i32,
}

#[derive(Clone)]
pub struct IdgRepository {
    pool: DbPool,
}

impl IdgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Replace the stored target list in one transaction.
    pub async fn replace_targets(&self, targets: &[IdgTarget]) -> Result<usize, DieselError> {
        let records: Vec<IdgTargetRecord> = targets.iter().map(IdgTargetRecord::from).collect();

        with_conn!(self.pool, conn, {
            conn.transaction::<_, DieselError, _>(|conn| {
                let records = &records;
                Box::pin(async move {
                    diesel::delete(idg_target::table).execute(conn).await?;
                    let mut written = 0;
                    for row in records {
                        written += diesel::insert_into(idg_target::table)
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

    pub async fn targets(&self) -> Result<Vec<IdgTarget>, DieselError> {
        let records: Vec<IdgTargetRecord> = with_conn!(self.pool, conn, {
            idg_target::table
                .order(idg_target::uniprot_acc.asc())
                .select(IdgTargetRecord::as_select())
                .load(&mut conn)
                .await?
        });
        Ok(records.into_iter().map(IdgTarget::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            idg_target::table.count().get_result(&mut conn).await
        })
    }

    /// Target-linked hits aggregated per (entity, target, patent).
    pub async fn retrieve_annotations(&self) -> Result<Vec<IdgAnnotation>, DieselError> {
        let rows: Vec<IdgHitRow> = with_conn!(self.pool, conn, {
            diesel::sql_query(IDG_HITS_QUERY).load(&mut conn).await?
        });
        aggregate_hits(rows)
    }
}

/// Fold frequency rows into one report row per (entity, target, patent).
///
/// Terms from every field are summed and rendered as `term:count`, highest
/// count first, ties by term.
pub fn aggregate_hits(rows: Vec<IdgHitRow>) -> Result<Vec<IdgAnnotation>, DieselError> {
    let mut grouped: BTreeMap<(String, String, String), (IdgAnnotation, HashMap<String, i64>)> =
        BTreeMap::new();

    for row in rows {
        let key = (
            row.entity_name.clone(),
            row.uniprot_acc.clone(),
            row.patent_number.clone(),
        );
        let (entry, terms) = match grouped.entry(key) {
            std::collections::btree_map::Entry::Occupied(slot) => slot.into_mut(),
            std::collections::btree_map::Entry::Vacant(slot) => {
                let annotation = IdgAnnotation {
                    publication_date: parse_date(&row.publication_date)?,
                    entity_name: row.entity_name,
                    uniprot_acc: row.uniprot_acc,
                    target_name: row.target_name,
                    development_level: row.development_level,
                    target_family: row.target_family,
                    patent_number: row.patent_number,
                    total_hits: 0,
                    description_hits: 0,
                    claims_hits: 0,
                    abstract_hits: 0,
                    title_hits: 0,
                    terms: String::new(),
                };
                slot.insert((annotation, HashMap::new()))
            }
        };

        let hits = i64::from(row.frequency);
        entry.total_hits += hits;
        match Field::from_id(row.field_id) {
            Some(Field::Description) => entry.description_hits += hits,
            Some(Field::Claims) => entry.claims_hits += hits,
            Some(Field::Abstract) => entry.abstract_hits += hits,
            Some(Field::Title) => entry.title_hits += hits,
            _ => {}
        }
        *terms.entry(row.term).or_default() += hits;
    }

    Ok(grouped
        .into_values()
        .map(|(mut annotation, terms)| {
            let mut terms: Vec<(String, i64)> = terms.into_iter().collect();
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            annotation.terms = terms
                .iter()
                .map(|(term, count)| format!("{}:{}", term, count))
                .collect::<Vec<_>>()
                .join(",");
            annotation
        })
        .collect())
}
