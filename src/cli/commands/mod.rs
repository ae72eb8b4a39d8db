//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod annotate;
mod dictionary;
mod migrate;
mod report;
mod status;
mod targets;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "patent-annotator")]
#[command(about = "Incremental biomedical entity annotation of published patents")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Discover new patents, fetch their XML and annotate everything pending (default)
    Run,

    /// Apply pending annotation store migrations
    Migrate,

    /// Import the tagger dictionary, or check it against the stored one
    CheckDictionary,

    /// Replace the stored IDG target list
    LoadTargets {
        /// Target TSV file (defaults to idg_targets.path)
        path: Option<PathBuf>,
    },

    /// Write the IDG hit report
    Report {
        /// Output file (defaults to idg_output.path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show annotation store counts
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, _config) = load_settings_with_options(options).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => annotate::cmd_run(&settings).await,
        Commands::Migrate => migrate::cmd_migrate(&settings).await,
        Commands::CheckDictionary => dictionary::cmd_check_dictionary(&settings).await,
        Commands::LoadTargets { path } => targets::cmd_load_targets(&settings, path).await,
        Commands::Report { output } => report::cmd_report(&settings, output).await,
        Commands::Status => status::cmd_status(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["patent-annotator"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["patent-annotator", "-v", "--config", "a.toml", "report", "-o", "out.tsv"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Some(Commands::Report { output: Some(_) })));

        let cli = Cli::try_parse_from(["patent-annotator", "check-dictionary", "--cwd"]).unwrap();
        assert!(cli.cwd);
        assert!(matches!(cli.command, Some(Commands::CheckDictionary)));
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["patent-annotator", "scrape"]).is_err());
    }
}
