//! Resolved application settings.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{Config, ConfigError};
use crate::annotator::TAGGER;
use crate::jobs::DEFAULT_BATCH_SIZE;
use crate::repository::util::sqlite_path;

/// Default annotation store, relative to the base directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "patent-annotator.db";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});

/// Application settings with defaults applied and paths resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Annotation store URL.
    pub database_url: String,
    /// Annotator name.
    pub annotator: String,
    /// Annotation worker threads (at least 1).
    pub threads: usize,
    /// Patents per persistence transaction.
    pub batch_size: usize,
    pub xml_home: Option<PathBuf>,
    pub catalog_url: Option<String>,
    xml_source_url: Option<String>,
    pub ensembl_url: Option<String>,
    pub ensembl_releases: Option<String>,
    pub dictionary_dir: Option<PathBuf>,
    pub email_to: Option<String>,
    pub idg_targets: Option<PathBuf>,
    pub idg_output: Option<PathBuf>,
    pub annotations_output: Option<PathBuf>,
    pub skip_output: bool,
}

impl Settings {
    /// Resolve a config against `base_dir`.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, ConfigError> {
        let path = |value: &Option<String>| value.as_deref().map(|p| config.resolve_path(p, base_dir));
        let url = |value: &Option<String>| {
            value
                .as_deref()
                .map(|u| database_url(&config.resolve_path(sqlite_path(u), base_dir)))
        };

        let threads = match config.annotator.threads {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "annotator.threads",
                    message: "must be a positive integer".to_string(),
                })
            }
            Some(n) => usize::try_from(n).map_err(|e| ConfigError::Invalid {
                key: "annotator.threads",
                message: e.to_string(),
            })?,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };

        let batch_size = match config.persistence.batch_size {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "persistence.batch_size",
                    message: "must be a positive integer".to_string(),
                })
            }
            Some(n) => usize::try_from(n).map_err(|e| ConfigError::Invalid {
                key: "persistence.batch_size",
                message: e.to_string(),
            })?,
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            database_url: url(&config.database)
                .unwrap_or_else(|| database_url(&base_dir.join(DEFAULT_DATABASE_FILENAME))),
            annotator: config
                .annotator
                .name
                .clone()
                .unwrap_or_else(|| TAGGER.to_string()),
            threads,
            batch_size,
            xml_home: path(&config.patents.xml_home),
            catalog_url: url(&config.sources.catalog),
            xml_source_url: url(&config.sources.xml),
            ensembl_url: url(&config.ensembl.url),
            ensembl_releases: config.ensembl.releases.clone(),
            dictionary_dir: path(&config.tagger.dictionary_dir),
            email_to: config.email.to.clone(),
            idg_targets: path(&config.idg_targets.path),
            idg_output: path(&config.idg_output.path),
            annotations_output: path(&config.annotations_output.path),
            skip_output: config.output.skip,
        })
    }

    pub fn require_xml_home(&self) -> Result<&Path, ConfigError> {
        self.xml_home
            .as_deref()
            .ok_or(ConfigError::Missing("patents.xml_home"))
    }

    pub fn require_catalog_url(&self) -> Result<&str, ConfigError> {
        self.catalog_url
            .as_deref()
            .ok_or(ConfigError::Missing("sources.catalog"))
    }

    /// Upstream XML store, defaulting to the catalog database.
    pub fn require_xml_source_url(&self) -> Result<&str, ConfigError> {
        match self.xml_source_url.as_deref() {
            Some(url) => Ok(url),
            None => self.require_catalog_url(),
        }
    }

    pub fn require_ensembl_releases(&self) -> Result<&str, ConfigError> {
        self.ensembl_releases
            .as_deref()
            .ok_or(ConfigError::Missing("ensembl.releases"))
    }

    /// Whether warning/error e-mail notification can be enabled.
    ///
    /// Logs a warning when it cannot; never fails startup.
    pub fn check_email(&self) -> bool {
        match self.email_to.as_deref() {
            Some(to) if is_valid_email(to) => {
                tracing::debug!("Warnings and errors will be reported to {}", to);
                true
            }
            Some(to) => {
                tracing::warn!("Invalid e-mail address '{}', e-mail notification is disabled", to);
                false
            }
            None => {
                tracing::warn!("No e-mail address configured, e-mail notification is disabled");
                false
            }
        }
    }
}

fn database_url(path: &Path) -> String {
    format!("sqlite:{}", path.display())
}

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_PATTERN.is_match(address.trim())
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    let settings = Settings::from_config(&config, &base_dir)?;
    Ok((settings, config))
}
