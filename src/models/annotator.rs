use serde::{Deserialize, Serialize};

/// An annotator registered in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatorMetadata {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for AnnotatorMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (id {})", self.name, self.id)
    }
}
