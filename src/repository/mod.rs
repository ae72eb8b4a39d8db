//! Repository layer for the annotation store.
//!
//! All database access uses Diesel ORM over SQLite.

pub mod context;
pub mod models;
pub mod pool;

// Repositories
pub mod annotations;
pub mod annotators;
pub mod dictionary;
pub mod ensembl;
pub mod idg;
pub mod patents;

// Utilities
pub mod util;

// Migrations
pub mod migrations;

pub use annotations::{AnnotationRepository, BatchSummary};
pub use annotators::AnnotatorRepository;
pub use context::DbContext;
pub use dictionary::{DictionaryRepository, DictionarySaveError};
pub use ensembl::EnsemblRepository;
pub use idg::IdgRepository;
pub use patents::PatentRepository;
pub use pool::{DbPool, DieselError};
