//! Batched, transactional persistence of patent annotations.
//!
//! A batch commit writes raw annotations, per-patent entity frequencies and
//! the annotated-by marks together. The mark is the only completion signal,
//! so nothing here writes it outside that transaction.

use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{error, warn};

use super::models::{AnnotationCountRecord, AnnotationRecord, NewAnnotatedBy, NewAnnotation};
use super::pool::{DbPool, DieselError};
use crate::models::{normalize_term, AnnotatedPatent, Dictionary, MAX_TERM_LENGTH};
use crate::schema::{annotation, bioentity_patent_annotation_count, patent_annotated_by};
use crate::with_conn;

/// Rows derived from a batch, ready to be written.
#[derive(Debug, Default)]
pub struct PreparedBatch<'a> {
    pub annotations: Vec<NewAnnotation<'a>>,
    pub frequencies: Vec<AnnotationCountRecord>,
    pub marks: Vec<NewAnnotatedBy>,
    /// Annotations dropped because the term exceeds `MAX_TERM_LENGTH`.
    pub oversized_terms: usize,
    /// Annotations dropped because the entity is not in the dictionary.
    pub unknown_entities: usize,
}

/// Counts of what a committed batch wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub patents: usize,
    pub annotations: usize,
    pub frequencies: usize,
    pub dropped: usize,
}

/// Build the rows for a batch.
///
/// Frequencies group annotations by entity, patent, field and the term with
/// case folded and trailing whitespace removed; each group stores the first
/// term seen. Every patent gets a mark, annotated or not.
pub fn prepare_batch<'a>(
    annotator_id: i32,
    dictionary: &Dictionary,
    batch: &'a [AnnotatedPatent],
) -> PreparedBatch<'a> {
    let mut prepared = PreparedBatch::default();
    let mut frequencies: BTreeMap<(i32, i32, i32, String), (&'a str, i32)> = BTreeMap::new();

    for patent in batch {
        let patent_id = patent.metadata.id;
        prepared.marks.push(NewAnnotatedBy {
            patent_id,
            annotator_id,
        });

        for found in &patent.annotations {
            let tag = &found.tag;
            if !tag.term_fits() {
                warn!(
                    patent = %patent.metadata.patent_number,
                    "Skipping annotation of {} {}: term is longer than {} characters: {}",
                    tag.entity_type,
                    tag.name,
                    MAX_TERM_LENGTH,
                    tag.term
                );
                prepared.oversized_terms += 1;
                continue;
            }

            let Some(bio_entity_id) = dictionary.lookup(&tag.entity_type, &tag.name) else {
                error!(
                    patent = %patent.metadata.patent_number,
                    "Entity {} of type {} is not in the dictionary; annotation not saved",
                    tag.name,
                    tag.entity_type
                );
                prepared.unknown_entities += 1;
                continue;
            };

            let field_id = found.field.id();
            prepared.annotations.push(NewAnnotation {
                patent_id,
                field_id,
                rank: found.rank,
                bio_entity_id,
                start_offset: offset(tag.start),
                end_offset: offset(tag.end),
                term: &tag.term,
            });

            frequencies
                .entry((bio_entity_id, patent_id, field_id, normalize_term(&tag.term)))
                .or_insert((&tag.term, 0))
                .1 += 1;
        }
    }

    prepared.frequencies = frequencies
        .into_iter()
        .map(
            |((bio_entity_id, patent_id, field_id, _), (term, frequency))| AnnotationCountRecord {
                bio_entity_id,
                patent_id,
                field_id,
                term: term.to_string(),
                frequency,
            },
        )
        .collect();

    prepared
}

fn offset(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Clone)]
pub struct AnnotationRepository {
    pool: DbPool,
}

impl AnnotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Commit a batch: raw annotations, then frequencies, then marks, all in
    /// one transaction.
    pub async fn save_batch(
        &self,
        annotator_id: i32,
        dictionary: &Dictionary,
        batch: &[AnnotatedPatent],
    ) -> Result<BatchSummary, DieselError> {
        let prepared = prepare_batch(annotator_id, dictionary, batch);
        let summary = BatchSummary {
            patents: prepared.marks.len(),
            annotations: prepared.annotations.len(),
            frequencies: prepared.frequencies.len(),
            dropped: prepared.oversized_terms + prepared.unknown_entities,
        };

        with_conn!(self.pool, conn, {
            conn.transaction::<_, DieselError, _>(|conn| {
                let prepared = &prepared;
                Box::pin(async move {
                    for row in &prepared.annotations {
                        diesel::insert_into(annotation::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &prepared.frequencies {
                        diesel::insert_into(bioentity_patent_annotation_count::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &prepared.marks {
                        diesel::insert_into(patent_annotated_by::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await?;
        });

        Ok(summary)
    }

    /// Raw annotations of a patent in insertion order.
    pub async fn annotations_for(
        &self,
        patent_id: i32,
    ) -> Result<Vec<AnnotationRecord>, DieselError> {
        with_conn!(self.pool, conn, {
            annotation::table
                .filter(annotation::patent_id.eq(patent_id))
                .order(annotation::annotation_id.asc())
                .select(AnnotationRecord::as_select())
                .load(&mut conn)
                .await
        })
    }

    /// Frequency rows of a patent.
    pub async fn frequencies_for(
        &self,
        patent_id: i32,
    ) -> Result<Vec<AnnotationCountRecord>, DieselError> {
        with_conn!(self.pool, conn, {
            bioentity_patent_annotation_count::table
                .filter(bioentity_patent_annotation_count::patent_id.eq(patent_id))
                .order((
                    bioentity_patent_annotation_count::bio_entity_id.asc(),
                    bioentity_patent_annotation_count::field_id.asc(),
                    bioentity_patent_annotation_count::term.asc(),
                ))
                .select(AnnotationCountRecord::as_select())
                .load(&mut conn)
                .await
        })
    }

    pub async fn count_annotations(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            annotation::table.count().get_result(&mut conn).await
        })
    }

    pub async fn count_frequencies(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            bioentity_patent_annotation_count::table
                .count()
                .get_result(&mut conn)
                .await
        })
    }

    /// Number of annotated-by marks for an annotator.
    pub async fn count_marks(&self, annotator_id: i32) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn, {
            patent_annotated_by::table
                .filter(patent_annotated_by::annotator_id.eq(annotator_id))
                .count()
                .get_result(&mut conn)
                .await
        })
    }
}
