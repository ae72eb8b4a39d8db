//! Store status command.

use console::style;

use crate::cli::helpers::open_store;
use crate::config::Settings;

/// Print row counts of the annotation store.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_store(settings).await?;

    println!("\n{}", style("Annotation store").bold());
    println!("{}", "-".repeat(40));
    println!("{:<24} {}", "Database:", settings.database_url);
    println!("{:<24} {}", "Patents:", ctx.patents().count().await?);

    match ctx.patents().latest_publication_date().await? {
        Some(date) => println!("{:<24} {}", "Latest publication:", date),
        None => println!("{:<24} {}", "Latest publication:", style("none").dim()),
    }

    match ctx.annotators().get(&settings.annotator).await? {
        Some(annotator) => {
            let dictionary = ctx.dictionary().get(&annotator).await?;
            println!("{:<24} {}", "Annotator:", annotator);
            println!("{:<24} {}", "Dictionary entities:", dictionary.len());
            println!(
                "{:<24} {}",
                "Annotated patents:",
                ctx.annotations().count_marks(annotator.id).await?
            );
        }
        None => println!(
            "{:<24} {}",
            "Annotator:",
            style(format!("{} (not registered)", settings.annotator)).yellow()
        ),
    }

    println!("{:<24} {}", "Annotations:", ctx.annotations().count_annotations().await?);
    println!("{:<24} {}", "Frequency rows:", ctx.annotations().count_frequencies().await?);
    println!("{:<24} {}", "IDG targets:", ctx.idg().count().await?);
    println!("{:<24} {}", "Ensembl mappings:", ctx.ensembl().count().await?);
    Ok(())
}
