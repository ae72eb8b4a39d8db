//! Configuration management using the prefer crate.
//!
//! A config file (TOML, YAML or JSON) is discovered by prefer or passed with
//! `--config`; environment variables override individual keys; the result is
//! resolved into [`Settings`] with absolute paths and defaults applied.

mod file;
mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    AnnotatorConfig, Config, EmailConfig, EnsemblConfig, OutputConfig, PathConfig,
    PatentsConfig, PersistenceConfig, SourcesConfig, TaggerConfig,
};
pub use settings::{is_valid_email, load_settings_with_options, LoadOptions, Settings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("missing required configuration key '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}
