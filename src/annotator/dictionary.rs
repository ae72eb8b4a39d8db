//! Tab-separated dictionary files of the built-in tagger.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DictionaryReader, TaggerError};
use crate::models::DictionaryEntry;

/// Entity type name of a numeric dictionary type id.
pub fn entity_type_name(type_id: i64) -> Option<&'static str> {
    match type_id {
        9606 => Some("HUMAN_GENE"),
        -1 => Some("CHEMICAL"),
        -2 => Some("ORGANISM"),
        -21 => Some("GO_BIOLOGICAL_PROCESS"),
        -22 => Some("GO_CELLULAR_COMPONENT"),
        -23 => Some("GO_MOLECULAR_FUNCTION"),
        -25 => Some("TISSUE"),
        -26 => Some("DISEASE"),
        -27 => Some("ENVIRONMENT"),
        _ => None,
    }
}

/// One row of `entities.tsv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntityRow {
    pub serial: String,
    pub entity_type: &'static str,
    pub identifier: String,
}

pub(crate) fn read_file(path: &Path) -> Result<String, TaggerError> {
    fs::read_to_string(path).map_err(|source| TaggerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty lines split on tabs, with 1-based line numbers.
pub(crate) fn rows(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.split('\t').collect()))
}

/// Parse `entities.tsv`: `serial\ttype_id\tidentifier`.
pub(crate) fn parse_entities(path: &Path, content: &str) -> Result<Vec<EntityRow>, TaggerError> {
    let format_error = |line: usize, message: String| TaggerError::Format {
        path: path.to_path_buf(),
        line,
        message,
    };

    rows(content)
        .map(|(line, parts)| {
            if parts.len() < 3 {
                return Err(format_error(line, "expected 3 tab-separated columns".into()));
            }
            let type_id: i64 = parts[1]
                .trim()
                .parse()
                .map_err(|_| format_error(line, format!("invalid type id '{}'", parts[1])))?;
            let entity_type = entity_type_name(type_id).ok_or(TaggerError::UnknownType(type_id))?;
            Ok(EntityRow {
                serial: parts[0].trim().to_string(),
                entity_type,
                identifier: parts[2].trim().to_string(),
            })
        })
        .collect()
}

/// Reads `(type, identifier)` pairs from a dictionary's `entities.tsv`.
#[derive(Debug, Clone)]
pub struct TsvDictionaryReader {
    entities_path: PathBuf,
}

impl TsvDictionaryReader {
    pub fn new(entities_path: impl Into<PathBuf>) -> Self {
        Self {
            entities_path: entities_path.into(),
        }
    }
}

impl DictionaryReader for TsvDictionaryReader {
    fn read(&self) -> Result<Vec<DictionaryEntry>, TaggerError> {
        debug!("Reading tagger dictionary from {}", self.entities_path.display());
        let content = read_file(&self.entities_path)?;
        Ok(parse_entities(&self.entities_path, &content)?
            .into_iter()
            .map(|row| DictionaryEntry::new(row.entity_type, row.identifier))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reader_maps_type_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entities.tsv");
        fs::write(
            &path,
            "1\t9606\tENSP00000001\n2\t-26\tDOID:162\n\n3\t-1\tCIDs00002244\n",
        )
        .unwrap();

        let entries = TsvDictionaryReader::new(&path).read().unwrap();
        assert_eq!(
            entries,
            vec![
                DictionaryEntry::new("HUMAN_GENE", "ENSP00000001"),
                DictionaryEntry::new("DISEASE", "DOID:162"),
                DictionaryEntry::new("CHEMICAL", "CIDs00002244"),
            ]
        );
    }

    #[test]
    fn test_unknown_type_and_short_rows_fail() {
        let path = Path::new("entities.tsv");
        assert!(matches!(
            parse_entities(path, "1\t10090\tENSMUSP1\n"),
            Err(TaggerError::UnknownType(10090))
        ));
        assert!(matches!(
            parse_entities(path, "1\t9606\n"),
            Err(TaggerError::Format { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let reader = TsvDictionaryReader::new(dir.path().join("missing.tsv"));
        assert!(matches!(reader.read(), Err(TaggerError::Io { .. })));
    }
}
