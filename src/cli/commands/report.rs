//! IDG report command.

use std::path::PathBuf;

use console::style;

use crate::cli::helpers::open_store;
use crate::config::{ConfigError, Settings};
use crate::services::IdgService;

pub async fn cmd_report(settings: &Settings, output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = output
        .or_else(|| settings.idg_output.clone())
        .ok_or(ConfigError::Missing("idg_output.path"))?;

    let ctx = open_store(settings).await?;
    let rows = IdgService::new(ctx.idg()).write_report(&path).await?;

    println!(
        "{} Wrote {} report rows to {}",
        style("✓").green(),
        rows,
        path.display()
    );
    Ok(())
}
