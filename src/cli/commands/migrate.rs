//! Migrate command.

use console::style;

use crate::config::Settings;
use crate::repository::migrations::run_migrations;

/// Apply pending store migrations.
pub async fn cmd_migrate(settings: &Settings) -> anyhow::Result<()> {
    let applied = run_migrations(&settings.database_url).await?;

    if applied.is_empty() {
        println!("{} Store is up to date", style("✓").green());
    } else {
        for name in &applied {
            println!("  {} Applied {}", style("→").cyan(), name);
        }
        println!(
            "{} Applied {} migration(s) to {}",
            style("✓").green(),
            applied.len(),
            settings.database_url
        );
    }
    Ok(())
}
