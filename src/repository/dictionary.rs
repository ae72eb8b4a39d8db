//! Persisted annotator vocabularies (`bio_type` + `bio_entity`).

use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use thiserror::Error;
use tracing::info;

use super::models::{NewBioEntity, NewBioType};
use super::pool::{DbPool, DieselError};
use crate::models::{AnnotatorMetadata, Dictionary, DictionaryEntry};
use crate::schema::{bio_entity, bio_type};
use crate::with_conn;

#[derive(Debug, Error)]
pub enum DictionarySaveError {
    #[error(
        "annotator {annotator} already has {entities} dictionary entities; a populated dictionary cannot be updated"
    )]
    AlreadyPopulated { annotator: String, entities: usize },

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

#[derive(Clone)]
pub struct DictionaryRepository {
    pool: DbPool,
}

impl DictionaryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Load the dictionary stored for an annotator.
    pub async fn get(&self, annotator: &AnnotatorMetadata) -> Result<Dictionary, DieselError> {
        let rows: Vec<(String, String, i32)> = with_conn!(self.pool, conn, {
            bio_entity::table
                .inner_join(bio_type::table)
                .filter(bio_type::annotator_id.eq(annotator.id))
                .select((bio_type::name, bio_entity::name, bio_entity::bio_entity_id))
                .load(&mut conn)
                .await?
        });

        let mut dictionary = Dictionary::new();
        for (entity_type, name, id) in rows {
            dictionary.insert(&entity_type, &name, id);
        }
        Ok(dictionary)
    }

    /// Persist a dictionary for an annotator that has none yet.
    ///
    /// Types are written first, then entities, in one transaction. Fails with
    /// `DictionarySaveError::AlreadyPopulated` if the annotator already owns any
    /// entity. Returns the number of entities written.
    pub async fn save(
        &self,
        annotator: &AnnotatorMetadata,
        entries: &BTreeSet<DictionaryEntry>,
    ) -> Result<usize, DictionarySaveError> {
        let annotator_id = annotator.id;
        let types: BTreeSet<&str> = entries.iter().map(|e| e.entity_type.as_str()).collect();

        let mut conn = self.pool.get().await?;
        let written = conn
            .transaction::<_, DictionarySaveError, _>(|conn| {
                let types = &types;
                Box::pin(async move {
                    let existing: i64 = bio_entity::table
                        .inner_join(bio_type::table)
                        .filter(bio_type::annotator_id.eq(annotator_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if existing > 0 {
                        return Err(DictionarySaveError::AlreadyPopulated {
                            annotator: annotator.name.clone(),
                            entities: existing as usize,
                        });
                    }

                    let new_types: Vec<NewBioType<'_>> = types
                        .iter()
                        .map(|name| NewBioType {
                            name: *name,
                            annotator_id,
                        })
                        .collect();
                    for row in &new_types {
                        diesel::insert_or_ignore_into(bio_type::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }

                    let type_ids: HashMap<String, i32> = bio_type::table
                        .filter(bio_type::annotator_id.eq(annotator_id))
                        .select((bio_type::name, bio_type::bio_type_id))
                        .load::<(String, i32)>(conn)
                        .await?
                        .into_iter()
                        .collect();

                    let mut new_entities = Vec::with_capacity(entries.len());
                    for entry in entries {
                        let bio_type_id = *type_ids
                            .get(&entry.entity_type)
                            .ok_or(DieselError::NotFound)?;
                        new_entities.push(NewBioEntity {
                            bio_type_id,
                            name: &entry.name,
                        });
                    }

                    let mut written = 0;
                    for row in &new_entities {
                        written += diesel::insert_into(bio_entity::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    Ok(written)
                })
            })
            .await?;

        info!(
            "Saved {} entities of {} types for annotator {}",
            written,
            types.len(),
            annotator
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    fn entries(pairs: &[(&str, &str)]) -> BTreeSet<DictionaryEntry> {
        pairs
            .iter()
            .map(|(t, n)| DictionaryEntry::new(*t, *n))
            .collect()
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        let annotator = ctx.annotators().get_or_create("tagger").await.unwrap();
        let repo = ctx.dictionary();

        assert!(repo.get(&annotator).await.unwrap().is_empty());

        let written = repo
            .save(
                &annotator,
                &entries(&[
                    ("HUMAN_GENE", "ENSP00000001"),
                    ("HUMAN_GENE", "ENSP00000002"),
                    ("DISEASE", "DOID:1"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(written, 3);

        let dict = repo.get(&annotator).await.unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.lookup("HUMAN_GENE", "ENSP00000001").is_some());
        assert!(dict.lookup("DISEASE", "DOID:1").is_some());
        assert!(dict.lookup("DISEASE", "ENSP00000001").is_none());
    }

    #[tokio::test]
    async fn test_save_refuses_non_empty_dictionary() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        let annotator = ctx.annotators().get_or_create("tagger").await.unwrap();
        let repo = ctx.dictionary();

        repo.save(&annotator, &entries(&[("HUMAN_GENE", "ENSP00000001")]))
            .await
            .unwrap();

        let err = repo
            .save(&annotator, &entries(&[("HUMAN_GENE", "ENSP00000002")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DictionarySaveError::AlreadyPopulated { entities: 1, ref annotator } if annotator == "tagger"
        ));
        assert_eq!(repo.get(&annotator).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dictionaries_are_scoped_per_annotator() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::open(&dir.path().join("store.db")).await.unwrap();
        let tagger = ctx.annotators().get_or_create("tagger").await.unwrap();
        let other = ctx.annotators().get_or_create("other").await.unwrap();
        let repo = ctx.dictionary();

        repo.save(&tagger, &entries(&[("HUMAN_GENE", "ENSP00000001")]))
            .await
            .unwrap();
        repo.save(&other, &entries(&[("HUMAN_GENE", "ENSP00000001")]))
            .await
            .unwrap();

        let a = repo.get(&tagger).await.unwrap();
        let b = repo.get(&other).await.unwrap();
        assert_ne!(
            a.lookup("HUMAN_GENE", "ENSP00000001"),
            b.lookup("HUMAN_GENE", "ENSP00000001")
        );
    }
}
