//! Shared helper functions for CLI commands.

use std::sync::Arc;

use tracing::info;

use crate::annotator::{factory_for, TaggerFactory};
use crate::config::Settings;
use crate::models::{AnnotatorMetadata, Dictionary};
use crate::repository::DbContext;
use crate::services::DictionaryGuard;

/// Open the annotation store, applying pending migrations.
pub async fn open_store(settings: &Settings) -> anyhow::Result<DbContext> {
    Ok(DbContext::from_url(&settings.database_url).await?)
}

/// Tagger factory for the configured annotator.
pub fn tagger_factory(settings: &Settings) -> anyhow::Result<Arc<dyn TaggerFactory>> {
    Ok(factory_for(
        &settings.annotator,
        settings.dictionary_dir.as_deref(),
    )?)
}

/// Register the annotator and guard its dictionary.
///
/// Returns the annotator and the stored dictionary the run must use.
pub async fn prepare_annotator(
    ctx: &DbContext,
    factory: &dyn TaggerFactory,
) -> anyhow::Result<(AnnotatorMetadata, Dictionary)> {
    let annotator = ctx.annotators().get_or_create(factory.annotator_name()).await?;
    info!("Using annotator {}", annotator);

    let reader = factory.dictionary_reader();
    let dictionary = DictionaryGuard::new(ctx.dictionary())
        .verify(&annotator, reader.as_ref())
        .await?;
    Ok((annotator, dictionary))
}
