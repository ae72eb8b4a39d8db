//! In-memory view of an annotator's persisted vocabulary.

use std::collections::HashMap;

/// One `(type, name)` vocabulary member as read from disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DictionaryEntry {
    pub entity_type: String,
    pub name: String,
}

impl DictionaryEntry {
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
        }
    }
}

/// The persisted dictionary of one annotator, keyed by type then name.
///
/// Values are `bio_entity` ids, which every stored annotation references.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entities: HashMap<String, HashMap<String, i32>>,
    len: usize,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_type: &str, name: &str, bio_entity_id: i32) {
        let previous = self
            .entities
            .entry(entity_type.to_string())
            .or_default()
            .insert(name.to_string(), bio_entity_id);
        if previous.is_none() {
            self.len += 1;
        }
    }

    /// The `bio_entity` id of a `(type, name)` pair.
    pub fn lookup(&self, entity_type: &str, name: &str) -> Option<i32> {
        self.entities.get(entity_type)?.get(name).copied()
    }

    /// Every entity name of a type.
    pub fn names_of_type<'a>(&'a self, entity_type: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.entities
            .get(entity_type)
            .into_iter()
            .flat_map(|names| names.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_len() {
        let mut dict = Dictionary::new();
        dict.insert("HUMAN_GENE", "ENSP00000001", 1);
        dict.insert("HUMAN_GENE", "ENSP00000002", 2);
        dict.insert("CHEMICAL", "CIDs00001", 3);
        dict.insert("CHEMICAL", "CIDs00001", 3);

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.lookup("HUMAN_GENE", "ENSP00000002"), Some(2));
        assert_eq!(dict.lookup("CHEMICAL", "ENSP00000002"), None);
        assert_eq!(dict.lookup("DISEASE", "anything"), None);

        let mut genes: Vec<_> = dict.names_of_type("HUMAN_GENE").collect();
        genes.sort();
        assert_eq!(genes, vec!["ENSP00000001", "ENSP00000002"]);
        assert_eq!(dict.names_of_type("TISSUE").count(), 0);
    }
}
