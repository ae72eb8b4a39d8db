//! Data models for the patent annotator.

mod annotation;
mod annotator;
mod dictionary;
mod ensembl;
mod field;
mod idg;
mod patent;

pub use annotation::{normalize_term, AnnotatedPatent, PatentAnnotation, Tag, MAX_TERM_LENGTH};
pub use annotator::AnnotatorMetadata;
pub use dictionary::{Dictionary, DictionaryEntry};
pub use ensembl::PeptideMapping;
pub use field::Field;
pub use idg::{IdgAnnotation, IdgTarget};
pub use patent::{PatentContent, PatentMetadata};
