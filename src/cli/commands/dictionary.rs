//! Dictionary check command.

use console::style;

use crate::cli::helpers::{open_store, prepare_annotator, tagger_factory};
use crate::config::Settings;

/// Run the dictionary guard on its own.
pub async fn cmd_check_dictionary(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_store(settings).await?;
    let factory = tagger_factory(settings)?;
    let (annotator, dictionary) = prepare_annotator(&ctx, factory.as_ref()).await?;

    println!(
        "{} Dictionary of {} is consistent ({} entities)",
        style("✓").green(),
        annotator,
        dictionary.len()
    );
    Ok(())
}
