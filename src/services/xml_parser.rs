//! Extraction of annotatable text regions from patent XML.
//!
//! Regions are located with non-greedy `<tag ...>...</tag>` patterns and
//! returned verbatim, inner markup included. Only English occurrences (or
//! occurrences without a language) are kept.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::models::PatentContent;

static ABSTRACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<abstract.*?</abstract>").unwrap());
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<description.*?</description>").unwrap());
static CLAIMS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<claims.*?</claims>").unwrap());
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<invention-title.*?</invention-title>").unwrap());
static CITATIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<non-patent-citations.*?</non-patent-citations>").unwrap());

static LANG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"lang="([^"]*)""#).unwrap());
static UCID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"ucid="([^"]*)""#).unwrap());

/// Languages present in the corpus that are dropped without a warning.
const IGNORED_LANGUAGES: [&str; 16] = [
    "DE", "FR", "ES", "JA", "RU", "FI", "NL", "PT", "KO", "SV", "DA", "ZH", "NO", "IT", "AR", "HU",
];

/// Parse a patent document into its English text fields.
pub fn parse_patent(xml: &str) -> PatentContent {
    PatentContent {
        patent_number: UCID.captures(xml).map(|caps| caps[1].to_string()),
        titles: english_regions(&TITLE, xml),
        abstracts: english_regions(&ABSTRACT, xml),
        descriptions: english_regions(&DESCRIPTION, xml),
        claims: english_regions(&CLAIMS, xml),
        citations: english_regions(&CITATIONS, xml),
    }
}

fn english_regions(pattern: &Regex, xml: &str) -> Vec<String> {
    pattern
        .find_iter(xml)
        .map(|m| m.as_str())
        .filter(|region| is_accepted(region))
        .map(str::to_string)
        .collect()
}

fn is_accepted(region: &str) -> bool {
    let Some(caps) = LANG.captures(region) else {
        return true;
    };
    let lang = caps[1].to_uppercase();
    // Region subtags are ignored: en-GB is English
    let primary = lang.split(['-', '_']).next().unwrap_or_default();
    if primary.is_empty() || primary == "EN" {
        return true;
    }
    if !IGNORED_LANGUAGES.contains(&primary) {
        let preview: String = region.chars().take(80).collect();
        warn!("Unexpected lang {} in {}", lang, preview);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<patent-document ucid="EP-1-A1" lang="EN">
  <bibliographic-data>
    <invention-title lang="DE">Titel</invention-title>
    <invention-title lang="en">Title</invention-title>
    <invention-title lang="">Untagged title</invention-title>
    <non-patent-citations><nplcit>Some paper</nplcit></non-patent-citations>
  </bibliographic-data>
  <abstract lang="EN"><p>ENSP00000001 is
mentioned</p></abstract>
  <abstract lang="XX"><p>unknown</p></abstract>
  <claims lang="FR"><claim>revendication</claim></claims>
</patent-document>"#;

    #[test]
    fn test_extracts_english_fields() {
        let content = parse_patent(XML);

        assert_eq!(content.patent_number.as_deref(), Some("EP-1-A1"));
        assert_eq!(
            content.titles,
            vec![
                r#"<invention-title lang="en">Title</invention-title>"#,
                r#"<invention-title lang="">Untagged title</invention-title>"#,
            ]
        );
        assert_eq!(content.abstracts.len(), 1);
        assert!(content.abstracts[0].contains("ENSP00000001 is\nmentioned"));
        assert!(content.claims.is_empty());
        assert!(content.descriptions.is_empty());
        assert_eq!(content.citations.len(), 1);
    }

    #[test]
    fn test_missing_ucid() {
        let content = parse_patent("<abstract>text</abstract>");
        assert_eq!(content.patent_number, None);
        assert_eq!(content.abstracts, vec!["<abstract>text</abstract>"]);
    }

    #[test]
    fn test_language_region_subtags_are_ignored() {
        let xml = r#"<patent-document ucid="GB-1-A1">
  <abstract lang="en-GB"><p>British abstract</p></abstract>
  <abstract lang="EN_us"><p>American abstract</p></abstract>
  <abstract lang="de-AT"><p>Kurzfassung</p></abstract>
</patent-document>"#;

        let content = parse_patent(xml);
        assert_eq!(content.abstracts.len(), 2);
        assert!(content.abstracts[0].contains("British"));
        assert!(content.abstracts[1].contains("American"));
    }
}
