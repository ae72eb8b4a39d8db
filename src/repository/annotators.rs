//! Annotator registry.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::info;

use super::models::{AnnotatorRecord, NewAnnotator};
use super::pool::{DbPool, DieselError};
use crate::models::AnnotatorMetadata;
use crate::schema::annotator;
use crate::with_conn;

#[derive(Clone)]
pub struct AnnotatorRepository {
    pool: DbPool,
}

impl AnnotatorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, name: &str) -> Result<Option<AnnotatorMetadata>, DieselError> {
        with_conn!(self.pool, conn, {
            annotator::table
                .filter(annotator::name.eq(name))
                .select(AnnotatorRecord::as_select())
                .first::<AnnotatorRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(AnnotatorMetadata::from))
        })
    }

    /// Return the named annotator, registering it on first use.
    pub async fn get_or_create(&self, name: &str) -> Result<AnnotatorMetadata, DieselError> {
        if let Some(existing) = self.get(name).await? {
            return Ok(existing);
        }

        with_conn!(self.pool, conn, {
            diesel::insert_or_ignore_into(annotator::table)
                .values(NewAnnotator { name })
                .execute(&mut conn)
                .await?;
        });

        let created = self
            .get(name)
            .await?
            .ok_or(DieselError::NotFound)?;
        info!("Registered annotator {}", created);
        Ok(created)
    }
}
