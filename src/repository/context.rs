//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all store operations.
//! It holds the connection pool and hands out repositories.

use std::path::Path;

use super::annotations::AnnotationRepository;
use super::annotators::AnnotatorRepository;
use super::dictionary::DictionaryRepository;
use super::ensembl::EnsemblRepository;
use super::idg::IdgRepository;
use super::migrations::run_migrations;
use super::patents::PatentRepository;
use super::pool::{DbPool, DieselError};

/// Annotation store context.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:annotations.db").await?;
/// let pending = ctx.patents().list_unannotated("tagger").await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Open a store from a database URL, applying pending migrations.
    pub async fn from_url(url: &str) -> Result<Self, DieselError> {
        let pool = DbPool::new(url);
        run_migrations(pool.database_url()).await?;
        Ok(Self { pool })
    }

    /// Open a store from a file path, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self, DieselError> {
        Self::from_url(&path.display().to_string()).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn annotators(&self) -> AnnotatorRepository {
        AnnotatorRepository::new(self.pool.clone())
    }

    pub fn dictionary(&self) -> DictionaryRepository {
        DictionaryRepository::new(self.pool.clone())
    }

    pub fn patents(&self) -> PatentRepository {
        PatentRepository::new(self.pool.clone())
    }

    pub fn annotations(&self) -> AnnotationRepository {
        AnnotationRepository::new(self.pool.clone())
    }

    pub fn idg(&self) -> IdgRepository {
        IdgRepository::new(self.pool.clone())
    }

    pub fn ensembl(&self) -> EnsemblRepository {
        EnsemblRepository::new(self.pool.clone())
    }
}
