//! Annotation run command.

use std::sync::Arc;

use console::style;
use tracing::{debug, info};

use crate::annotator::TAGGER;
use crate::cli::helpers::{open_store, prepare_annotator, tagger_factory};
use crate::config::Settings;
use crate::jobs::{AnnotatorJob, JobSettings};
use crate::models::Dictionary;
use crate::repository::DbContext;
use crate::services::{peptide_ids, EnsemblMapper, IdgService, PatentDiscovery, XmlFetcher};
use crate::sources::{SqliteEnsemblSource, SqliteSourceCatalog, SqliteXmlSource};
use crate::storage::{BlobStore, LocalBlobStore};

/// Full incremental run: dictionary guard, reference data, annotation job,
/// then the IDG report.
pub async fn cmd_run(settings: &Settings) -> anyhow::Result<()> {
    settings.check_email();

    // Required keys are checked before anything is written
    let xml_home = settings.require_xml_home()?;
    let catalog_url = settings.require_catalog_url()?;
    let xml_url = settings.require_xml_source_url()?;

    let ctx = open_store(settings).await?;
    let factory = tagger_factory(settings)?;
    let (annotator, dictionary) = prepare_annotator(&ctx, factory.as_ref()).await?;

    if let Some(ref path) = settings.idg_targets {
        IdgService::new(ctx.idg()).load_targets(path).await?;
    }

    if annotator.name == TAGGER {
        update_ensembl(settings, &ctx, &dictionary).await?;
    }

    if let Some(ref path) = settings.annotations_output {
        debug!("annotations_output.path is set to {} but is not written", path.display());
    }

    let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(xml_home));
    let discovery = PatentDiscovery::new(Arc::new(SqliteSourceCatalog::new(catalog_url)), ctx.patents());
    let fetcher = XmlFetcher::new(Arc::new(SqliteXmlSource::new(xml_url)), blob_store.clone());

    let job = AnnotatorJob::new(
        ctx.clone(),
        discovery,
        fetcher,
        blob_store,
        factory,
        annotator,
        Arc::new(dictionary),
        JobSettings {
            threads: settings.threads,
            batch_size: settings.batch_size,
        },
    );
    let summary = job.run().await?;

    println!(
        "{} {} new patents, {} annotated",
        style("✓").green(),
        summary.discovered,
        summary.annotated
    );
    if summary.annotated < summary.unannotated {
        println!(
            "{} {} patents have no XML yet and will be retried",
            style("!").yellow(),
            summary.unannotated - summary.annotated
        );
    }

    if settings.skip_output {
        info!("Skipping the IDG report");
    } else if let Some(ref path) = settings.idg_output {
        let rows = IdgService::new(ctx.idg()).write_report(path).await?;
        println!(
            "{} Wrote {} report rows to {}",
            style("✓").green(),
            rows,
            path.display()
        );
    } else {
        debug!("No IDG report path configured");
    }

    Ok(())
}

/// Refresh the Ensembl peptide mapping when a newer release is configured.
async fn update_ensembl(settings: &Settings, ctx: &DbContext, dictionary: &Dictionary) -> anyhow::Result<()> {
    let Some(ref url) = settings.ensembl_url else {
        debug!("No Ensembl source configured");
        return Ok(());
    };

    let mapper = EnsemblMapper::new(
        Arc::new(SqliteEnsemblSource::new(url)),
        ctx.ensembl(),
        settings.require_ensembl_releases()?,
    )?;

    if mapper.needs_update().await? {
        let mapped = mapper.update_mapping(&peptide_ids(dictionary)).await?;
        println!("{} Mapped {} Ensembl peptides to UniProt", style("✓").green(), mapped);
    } else {
        debug!("Ensembl mapping is up to date");
    }
    Ok(())
}
