//! Named-entity taggers.
//!
//! A tagger turns text into `(type, name, term, start, end)` tags. Taggers
//! are not thread-safe: each annotation worker builds its own through a
//! [`TaggerFactory`] and releases it with [`Tagger::shutdown`] when the
//! worker exits.

mod dictionary;
mod patent;
mod tagger;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::models::{DictionaryEntry, Tag};

pub use dictionary::{entity_type_name, TsvDictionaryReader};
pub use patent::PatentAnnotator;
pub use tagger::{DictionaryTagger, DictionaryTaggerFactory, ENTITIES_TSV, GLOBAL_TSV, NAMES_TSV};

/// Name of the built-in dictionary tagger.
pub const TAGGER: &str = "tagger";

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("unknown entity type id {0}")]
    UnknownType(i64),

    #[error("no tagger is registered under the annotator name '{0}'")]
    UnknownAnnotator(String),

    #[error("tagger dictionary directory is not configured")]
    DictionaryNotConfigured,

    #[error("tagging failed: {0}")]
    Failed(String),
}

/// Text-in, tags-out annotator owned by a single worker.
pub trait Tagger {
    fn annotate(&mut self, text: &str) -> Result<Vec<Tag>, TaggerError>;

    /// Release resources held by the tagger.
    fn shutdown(&mut self) {}
}

/// Reads the vocabulary a tagger can emit, as `(type, name)` pairs.
pub trait DictionaryReader {
    fn read(&self) -> Result<Vec<DictionaryEntry>, TaggerError>;
}

/// Builds taggers and dictionary readers for one annotator.
pub trait TaggerFactory: Send + Sync {
    /// Annotator name this factory serves.
    fn annotator_name(&self) -> &str;

    fn create_tagger(&self) -> Result<Box<dyn Tagger>, TaggerError>;

    fn dictionary_reader(&self) -> Box<dyn DictionaryReader + '_>;
}

/// Select the factory registered for an annotator name.
pub fn factory_for(
    annotator_name: &str,
    dictionary_dir: Option<&Path>,
) -> Result<Arc<dyn TaggerFactory>, TaggerError> {
    match annotator_name {
        TAGGER => {
            let dir = dictionary_dir.ok_or(TaggerError::DictionaryNotConfigured)?;
            Ok(Arc::new(DictionaryTaggerFactory::new(dir)))
        }
        other => Err(TaggerError::UnknownAnnotator(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_for_known_and_unknown_names() {
        let factory = factory_for(TAGGER, Some(Path::new("/dict"))).unwrap();
        assert_eq!(factory.annotator_name(), TAGGER);

        assert!(matches!(
            factory_for(TAGGER, None),
            Err(TaggerError::DictionaryNotConfigured)
        ));
        assert!(matches!(
            factory_for("leadmine", Some(Path::new("/dict"))),
            Err(TaggerError::UnknownAnnotator(name)) if name == "leadmine"
        ));
    }
}
