//! Field-by-field annotation of one patent.

use super::{Tagger, TaggerError};
use crate::models::{Field, PatentAnnotation, PatentContent};

/// Runs a worker's tagger over every accepted field occurrence of a patent.
///
/// Owns the tagger for the worker's lifetime and shuts it down on drop, so
/// the tagger is released on both normal exit and unwinding.
pub struct PatentAnnotator {
    tagger: Box<dyn Tagger>,
}

impl PatentAnnotator {
    pub fn new(tagger: Box<dyn Tagger>) -> Self {
        Self { tagger }
    }

    /// Annotations of all five fields. `rank` is the occurrence index of the
    /// field among accepted-language occurrences, in document order.
    pub fn annotate(&mut self, content: &PatentContent) -> Result<Vec<PatentAnnotation>, TaggerError> {
        let mut annotations = Vec::new();
        for field in Field::ALL {
            for (rank, text) in content.field(field).iter().enumerate() {
                let rank = i32::try_from(rank).unwrap_or(i32::MAX);
                annotations.extend(
                    self.tagger
                        .annotate(text)?
                        .into_iter()
                        .map(|tag| PatentAnnotation { field, rank, tag }),
                );
            }
        }
        Ok(annotations)
    }
}

impl Drop for PatentAnnotator {
    fn drop(&mut self) {
        self.tagger.shutdown();
    }
}
