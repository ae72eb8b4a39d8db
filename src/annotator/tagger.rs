//! Built-in dictionary tagger.
//!
//! Matches dictionary synonyms against text token by token. Matching is
//! case-insensitive, respects token boundaries and prefers the longest
//! synonym starting at a position. Offsets are byte offsets with an
//! inclusive end.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::dictionary::{parse_entities, read_file, rows, EntityRow};
use super::{DictionaryReader, Tagger, TaggerError, TsvDictionaryReader, TAGGER};
use crate::models::Tag;

pub const ENTITIES_TSV: &str = "entities.tsv";
pub const NAMES_TSV: &str = "names.tsv";
pub const GLOBAL_TSV: &str = "global.tsv";

/// A byte span of alphanumeric characters.
#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(Token { start: s, end: i });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            start: s,
            end: text.len(),
        });
    }
    tokens
}

/// Lookup key of a synonym: lowercase tokens joined by single spaces.
fn synonym_key(synonym: &str) -> String {
    tokenize(synonym)
        .iter()
        .map(|t| synonym[t.start..t.end].to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory synonym index of one dictionary.
pub struct DictionaryTagger {
    /// `(type, identifier)` per entity serial.
    entities: Vec<(&'static str, String)>,
    synonyms: HashMap<String, Vec<usize>>,
    max_tokens: usize,
}

impl DictionaryTagger {
    /// Load `entities.tsv`, `names.tsv` and, when present, `global.tsv`.
    pub fn load(dir: &Path) -> Result<Self, TaggerError> {
        let entities_path = dir.join(ENTITIES_TSV);
        let names_path = dir.join(NAMES_TSV);
        let global_path = dir.join(GLOBAL_TSV);

        let entity_rows = parse_entities(&entities_path, &read_file(&entities_path)?)?;
        let names = read_file(&names_path)?;
        let global = if global_path.is_file() {
            Some(read_file(&global_path)?)
        } else {
            None
        };

        Self::from_parts(&entity_rows, &names_path, &names, global.as_deref())
    }

    fn from_parts(
        entity_rows: &[EntityRow],
        names_path: &Path,
        names: &str,
        global: Option<&str>,
    ) -> Result<Self, TaggerError> {
        let mut entities = Vec::with_capacity(entity_rows.len());
        let mut by_serial: HashMap<&str, Vec<usize>> = HashMap::new();
        for row in entity_rows {
            by_serial
                .entry(row.serial.as_str())
                .or_default()
                .push(entities.len());
            entities.push((row.entity_type, row.identifier.clone()));
        }

        let blocked: HashSet<String> = global
            .map(|content| {
                rows(content)
                    .map(|(_, parts)| synonym_key(parts[0]))
                    .collect()
            })
            .unwrap_or_default();

        let mut synonyms: HashMap<String, Vec<usize>> = HashMap::new();
        let mut max_tokens = 0;
        for (line, parts) in rows(names) {
            if parts.len() < 2 {
                return Err(TaggerError::Format {
                    path: names_path.to_path_buf(),
                    line,
                    message: "expected serial and synonym".into(),
                });
            }
            let key = synonym_key(parts[1]);
            if key.is_empty() || blocked.contains(&key) {
                continue;
            }
            let Some(targets) = by_serial.get(parts[0].trim()) else {
                continue;
            };

            max_tokens = max_tokens.max(key.split(' ').count());
            let slot = synonyms.entry(key).or_default();
            for &target in targets {
                if !slot.contains(&target) {
                    slot.push(target);
                }
            }
        }

        debug!(
            "Dictionary tagger loaded {} entities, {} synonyms",
            entities.len(),
            synonyms.len()
        );

        Ok(Self {
            entities,
            synonyms,
            max_tokens,
        })
    }
}

impl Tagger for DictionaryTagger {
    fn annotate(&mut self, text: &str) -> Result<Vec<Tag>, TaggerError> {
        let tokens = tokenize(text);
        let lowered: Vec<String> = tokens
            .iter()
            .map(|t| text[t.start..t.end].to_lowercase())
            .collect();

        let mut tags = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let longest = self.max_tokens.min(tokens.len() - i);
            let found = (1..=longest).rev().find_map(|n| {
                let key = lowered[i..i + n].join(" ");
                self.synonyms.get(&key).map(|targets| (n, targets))
            });

            match found {
                Some((n, targets)) => {
                    let start = tokens[i].start;
                    let end = tokens[i + n - 1].end;
                    let term = &text[start..end];
                    for &target in targets {
                        let (entity_type, identifier) = &self.entities[target];
                        tags.push(Tag::new(*entity_type, identifier.as_str(), term, start, end - 1));
                    }
                    i += n;
                }
                None => i += 1,
            }
        }
        Ok(tags)
    }

    fn shutdown(&mut self) {
        self.synonyms.clear();
        self.entities.clear();
    }
}

/// Factory for the built-in tagger over a dictionary directory.
#[derive(Debug, Clone)]
pub struct DictionaryTaggerFactory {
    dir: PathBuf,
}

impl DictionaryTaggerFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl super::TaggerFactory for DictionaryTaggerFactory {
    fn annotator_name(&self) -> &str {
        TAGGER
    }

    fn create_tagger(&self) -> Result<Box<dyn Tagger>, TaggerError> {
        Ok(Box::new(DictionaryTagger::load(&self.dir)?))
    }

    fn dictionary_reader(&self) -> Box<dyn DictionaryReader + '_> {
        Box::new(TsvDictionaryReader::new(self.dir.join(ENTITIES_TSV)))
    }
}
