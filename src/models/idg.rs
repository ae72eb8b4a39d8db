//! Drug-target (IDG) models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A curated drug-target protein.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdgTarget {
    pub uniprot_acc: String,
    pub name: String,
    pub development_level: String,
    pub target_family: String,
}

/// Aggregated hits of one target-linked entity in one patent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdgAnnotation {
    pub entity_name: String,
    pub uniprot_acc: String,
    pub target_name: String,
    pub development_level: String,
    pub target_family: String,
    pub patent_number: String,
    pub publication_date: NaiveDate,
    pub total_hits: i64,
    pub description_hits: i64,
    pub claims_hits: i64,
    pub abstract_hits: i64,
    pub title_hits: i64,
    /// `term:count` pairs, highest count first.
    pub terms: String,
}
