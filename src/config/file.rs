//! On-disk configuration file structure.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Annotation store, as a SQLite path or `sqlite:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    #[prefer(default)]
    pub annotator: AnnotatorConfig,
    #[serde(default)]
    #[prefer(default)]
    pub patents: PatentsConfig,
    #[serde(default)]
    #[prefer(default)]
    pub ensembl: EnsemblConfig,
    #[serde(default)]
    #[prefer(default)]
    pub email: EmailConfig,
    /// IDG target list to load before annotating.
    #[serde(default, alias = "idg-targets")]
    #[prefer(default)]
    pub idg_targets: PathConfig,
    /// IDG report written after a run.
    #[serde(default, alias = "idg-output")]
    #[prefer(default)]
    pub idg_output: PathConfig,
    /// Accepted for compatibility; nothing is written there.
    #[serde(default, alias = "annotations-output")]
    #[prefer(default)]
    pub annotations_output: PathConfig,
    #[serde(default)]
    #[prefer(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    #[prefer(default)]
    pub tagger: TaggerConfig,
    #[serde(default)]
    #[prefer(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    #[prefer(default)]
    pub output: OutputConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct AnnotatorConfig {
    /// Annotator name; selects the tagger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Annotation worker threads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct PatentsConfig {
    /// Root of the patent XML blob store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_home: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct EnsemblConfig {
    /// Comma-separated releases, newest first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases: Option<String>,
    /// Ensembl cross-reference database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct PathConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct SourcesConfig {
    /// Upstream patent catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// Upstream XML store; the catalog when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct TaggerConfig {
    /// Directory holding entities.tsv, names.tsv and global.tsv.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct PersistenceConfig {
    /// Patents per transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct OutputConfig {
    /// Skip the IDG report after a run.
    #[serde(default)]
    #[prefer(default)]
    pub skip: bool,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers patent-annotator config files in standard locations.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load("patent-annotator").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default_with_env()),
            },
            Err(_) => {
                // No config file found, use defaults with env overrides
                Ok(Self::default_with_env())
            }
        }
    }

    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| format!("invalid TOML: {}", e)),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| format!("invalid YAML: {}", e))
            }
            _ => serde_json::from_str(contents).map_err(|e| format!("invalid JSON: {}", e)),
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database = Some(url);
        }
        if let Some(name) = get("ANNOTATOR") {
            self.annotator.name = Some(name);
        }
        if let Some(threads) = get("ANNOTATOR_THREADS") {
            match threads.trim().parse() {
                Ok(n) => self.annotator.threads = Some(n),
                Err(_) => tracing::warn!("Ignoring ANNOTATOR_THREADS={}: not a number", threads),
            }
        }
        if let Some(home) = get("PATENTS_XML_HOME") {
            self.patents.xml_home = Some(home);
        }
        if let Some(releases) = get("ENSEMBL_RELEASES") {
            self.ensembl.releases = Some(releases);
        }
        if let Some(url) = get("ENSEMBL_URL") {
            self.ensembl.url = Some(url);
        }
        if let Some(to) = get("EMAIL_TO") {
            self.email.to = Some(to);
        }
        if let Some(url) = get("SOURCE_CATALOG_URL") {
            self.sources.catalog = Some(url);
        }
        if let Some(url) = get("SOURCE_XML_URL") {
            self.sources.xml = Some(url);
        }
        if let Some(dir) = get("TAGGER_DICTIONARY") {
            self.tagger.dictionary_dir = Some(dir);
        }
        self
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml_sections() {
        let config = Config::parse(
            r#"
database = "store.db"

[annotator]
name = "tagger"
threads = 4

[patents]
xml_home = "xml"

[ensembl]
releases = "87,86"

[idg-targets]
path = "targets.tsv"

[output]
skip = true
"#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.database.as_deref(), Some("store.db"));
        assert_eq!(config.annotator.name.as_deref(), Some("tagger"));
        assert_eq!(config.annotator.threads, Some(4));
        assert_eq!(config.patents.xml_home.as_deref(), Some("xml"));
        assert_eq!(config.ensembl.releases.as_deref(), Some("87,86"));
        assert_eq!(config.idg_targets.path.as_deref(), Some("targets.tsv"));
        assert!(config.output.skip);
        assert_eq!(config.persistence.batch_size, None);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse("annotator:\n  threads: 2\nemail:\n  to: a@b.org\n", "yml").unwrap();
        assert_eq!(yaml.annotator.threads, Some(2));
        assert_eq!(yaml.email.to.as_deref(), Some("a@b.org"));

        let json = Config::parse(r#"{"sources": {"catalog": "sqlite:up.db"}}"#, "json").unwrap();
        assert_eq!(json.sources.catalog.as_deref(), Some("sqlite:up.db"));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = [
            ("ANNOTATOR_THREADS", "8"),
            ("PATENTS_XML_HOME", "/srv/xml"),
            ("EMAIL_TO", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.annotator.threads = Some(2);
        config.email.to = Some("ops@example.org".to_string());

        let config = config.with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.annotator.threads, Some(8));
        assert_eq!(config.patents.xml_home.as_deref(), Some("/srv/xml"));
        assert_eq!(config.email.to.as_deref(), Some("ops@example.org"));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patent-annotator.toml");
        std::fs::write(&path, "[patents]\nxml_home = \"xml\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
        assert_eq!(
            config.resolve_path("xml", dir.path()),
            dir.path().join("xml")
        );
    }

    #[tokio::test]
    async fn test_load_from_path_rejects_bad_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[patents\n").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
