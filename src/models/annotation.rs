//! Tags produced by a tagger and their patent-level context.

use serde::{Deserialize, Serialize};

use super::{Field, PatentMetadata};

/// Width of the `term` column. Longer terms are never persisted.
pub const MAX_TERM_LENGTH: usize = 127;

/// A single match reported by a tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Entity type name, e.g. `HUMAN_GENE`.
    pub entity_type: String,
    /// Entity name as stored in the dictionary.
    pub name: String,
    /// Surface form found in the text.
    pub term: String,
    pub start: usize,
    pub end: usize,
}

impl Tag {
    pub fn new(
        entity_type: impl Into<String>,
        name: impl Into<String>,
        term: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
            term: term.into(),
            start,
            end,
        }
    }

    /// Whether the term fits in the store's term column.
    pub fn term_fits(&self) -> bool {
        self.term.chars().count() <= MAX_TERM_LENGTH
    }
}

/// A tag located in a specific field occurrence of a patent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatentAnnotation {
    pub field: Field,
    pub rank: i32,
    pub tag: Tag,
}

/// A patent together with every annotation found in it.
#[derive(Debug, Clone)]
pub struct AnnotatedPatent {
    pub metadata: PatentMetadata,
    pub annotations: Vec<PatentAnnotation>,
}

/// Grouping key for frequency aggregation: lowercase, trailing whitespace
/// removed.
pub fn normalize_term(term: &str) -> String {
    term.trim_end().to_lowercase()
}
