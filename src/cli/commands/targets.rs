//! IDG target loading command.

use std::path::PathBuf;

use console::style;

use crate::cli::helpers::open_store;
use crate::config::{ConfigError, Settings};
use crate::services::IdgService;

pub async fn cmd_load_targets(settings: &Settings, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path
        .or_else(|| settings.idg_targets.clone())
        .ok_or(ConfigError::Missing("idg_targets.path"))?;

    let ctx = open_store(settings).await?;
    let loaded = IdgService::new(ctx.idg()).load_targets(&path).await?;

    println!(
        "{} Loaded {} IDG targets from {}",
        style("✓").green(),
        loaded,
        path.display()
    );
    Ok(())
}
