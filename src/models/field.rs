//! Annotated patent text fields.

use serde::{Deserialize, Serialize};

/// A patent text region that gets annotated.
///
/// The numeric ids are stored in the annotation tables and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    Claims,
    Abstract,
    Title,
    Citations,
}

impl Field {
    /// Every field, in annotation order.
    pub const ALL: [Field; 5] = [
        Field::Description,
        Field::Claims,
        Field::Abstract,
        Field::Title,
        Field::Citations,
    ];

    pub fn id(&self) -> i32 {
        match self {
            Self::Description => 1,
            Self::Claims => 2,
            Self::Abstract => 3,
            Self::Title => 4,
            Self::Citations => 16,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Description),
            2 => Some(Self::Claims),
            3 => Some(Self::Abstract),
            4 => Some(Self::Title),
            16 => Some(Self::Citations),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Claims => "claims",
            Self::Abstract => "abstract",
            Self::Title => "title",
            Self::Citations => "citations",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ids_are_stable() {
        assert_eq!(Field::Description.id(), 1);
        assert_eq!(Field::Claims.id(), 2);
        assert_eq!(Field::Abstract.id(), 3);
        assert_eq!(Field::Title.id(), 4);
        assert_eq!(Field::Citations.id(), 16);
    }

    #[test]
    fn test_from_id() {
        for field in Field::ALL {
            assert_eq!(Field::from_id(field.id()), Some(field));
        }
        assert_eq!(Field::from_id(5), None);
    }
}
