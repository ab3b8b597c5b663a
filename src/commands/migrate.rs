// ABOUTME: Migrate and migration-status commands
// ABOUTME: Connect with the application URL and drive the ledger-backed migration runner

use crate::config::Settings;
use crate::migration::{self, MigrationRunReport, MigrationState, MigrationStatus};
use crate::postgres;
use anyhow::{Context, Result};
use std::path::Path;

/// Apply pending migrations found at `path` (a `.sql` file or a directory).
pub async fn migrate(settings: &Settings, path: &Path) -> Result<MigrationRunReport> {
    let url = settings.require_database_url()?;

    let migrations = migration::discover_migrations(path)
        .with_context(|| format!("Failed to load migrations from {}", path.display()))?;
    tracing::info!("Found {} migration(s) at {}", migrations.len(), path.display());

    tracing::info!("Connecting to database...");
    let mut client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("✓ Connected");

    let report = migration::run_migrations(&mut client, &migrations)
        .await
        .context("Migration failed")?;

    tracing::info!(
        "✓ Migrations complete: {} applied, {} already applied",
        report.applied.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Print applied/pending/modified/missing state for the migrations at `path`.
pub async fn migration_status(settings: &Settings, path: &Path) -> Result<Vec<MigrationStatus>> {
    let url = settings.require_database_url()?;

    let migrations = migration::discover_migrations(path)
        .with_context(|| format!("Failed to load migrations from {}", path.display()))?;
    let client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;

    let statuses = migration::migration_status(&client, &migrations)
        .await
        .context("Failed to read migration ledger")?;

    println!("{}", render_status(&statuses));
    Ok(statuses)
}

fn render_status(statuses: &[MigrationStatus]) -> String {
    if statuses.is_empty() {
        return "No migrations found".to_string();
    }

    statuses
        .iter()
        .map(|status| {
            let state = match &status.state {
                MigrationState::Applied { applied_at } => format!("applied   {}", applied_at),
                MigrationState::Pending => "pending".to_string(),
                MigrationState::Modified => "MODIFIED  checksum differs from ledger".to_string(),
                MigrationState::Missing => "missing   recorded but not on disk".to_string(),
            };
            format!("  {:<40} {}", status.id, state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_are_aligned() {
        let rendered = render_status(&[
            MigrationStatus {
                id: "002_standalone_schema.sql".into(),
                state: MigrationState::Applied {
                    applied_at: "2025-01-15 10:00:00+00".into(),
                },
            },
            MigrationStatus {
                id: "003_add_password_hash.sql".into(),
                state: MigrationState::Pending,
            },
        ]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            format!("  {:<40} applied   2025-01-15 10:00:00+00", "002_standalone_schema.sql")
        );
        assert_eq!(lines[1], format!("  {:<40} pending", "003_add_password_hash.sql"));
    }

    #[test]
    fn empty_status_says_so() {
        assert_eq!(render_status(&[]), "No migrations found");
    }
}
