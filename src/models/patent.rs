//! Patent metadata and extracted text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A patent known to the annotation store.
///
/// `id` is 0 until the patent has been persisted; upstream catalogs never
/// assign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatentMetadata {
    pub id: i32,
    pub patent_number: String,
    pub publication_date: NaiveDate,
}

impl PatentMetadata {
    /// Create metadata for a patent that is not in the store yet.
    pub fn new(patent_number: impl Into<String>, publication_date: NaiveDate) -> Self {
        Self {
            id: 0,
            patent_number: patent_number.into(),
            publication_date,
        }
    }
}

/// Text regions extracted from a patent's XML, English only.
///
/// Each field keeps one entry per accepted occurrence, in document order;
/// the index of an entry is its rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatentContent {
    pub patent_number: Option<String>,
    pub titles: Vec<String>,
    pub abstracts: Vec<String>,
    pub descriptions: Vec<String>,
    pub claims: Vec<String>,
    pub citations: Vec<String>,
}

impl PatentContent {
    /// Texts for a given field.
    pub fn field(&self, field: super::Field) -> &[String] {
        use super::Field;
        match field {
            Field::Title => &self.titles,
            Field::Abstract => &self.abstracts,
            Field::Description => &self.descriptions,
            Field::Claims => &self.claims,
            Field::Citations => &self.citations,
        }
    }
}
