// ABOUTME: Schema migration runner backed by a ledger table
// ABOUTME: Applies pending SQL files in order, one transaction per migration

pub mod files;
pub mod ledger;

pub use files::{compute_checksum, discover_migrations, load_migration, MigrationFile};
pub use ledger::{AppliedMigration, MigrationState, MigrationStatus, PlannedStep};

use crate::error::AdminResult;
use std::time::Instant;
use tokio_postgres::Client;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationRunReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Apply every pending migration in `migrations`, in the given order.
///
/// Each migration's SQL and its ledger row run in one transaction: a failure rolls
/// back that migration entirely and stops the run, leaving earlier migrations
/// committed. The ledger is checked for edited migrations before anything runs.
/// A session advisory lock, taken before the ledger is created, keeps concurrent
/// runners from interleaving.
pub async fn run_migrations(
    client: &mut Client,
    migrations: &[MigrationFile],
) -> AdminResult<MigrationRunReport> {
    client
        .execute("SELECT pg_advisory_lock($1)", &[&ledger::MIGRATION_LOCK_KEY])
        .await?;
    let result = match ledger::ensure_ledger(client).await {
        Ok(()) => apply_pending(client, migrations).await,
        Err(e) => Err(e),
    };
    if let Err(e) = client
        .execute("SELECT pg_advisory_unlock($1)", &[&ledger::MIGRATION_LOCK_KEY])
        .await
    {
        // The lock is session scoped and goes away with the connection anyway
        tracing::warn!("Failed to release migration lock: {}", e);
    }

    result
}

async fn apply_pending(
    client: &mut Client,
    migrations: &[MigrationFile],
) -> AdminResult<MigrationRunReport> {
    let applied = ledger::applied_migrations(client).await?;
    let steps = ledger::plan(migrations, &applied)?;

    let mut report = MigrationRunReport::default();
    for step in steps {
        match step {
            PlannedStep::AlreadyApplied(migration) => {
                tracing::info!("✓ {} already applied, skipping", migration.id);
                report.skipped.push(migration.id.clone());
            }
            PlannedStep::Apply(migration) => {
                tracing::info!("Running migration: {}", migration.id);
                let started = Instant::now();

                let tx = client.transaction().await?;
                if let Err(e) = tx.batch_execute(&migration.sql).await {
                    tracing::error!("✗ Migration {} failed and was rolled back", migration.id);
                    return Err(e.into());
                }
                let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
                ledger::record_applied(&tx, migration, duration_ms).await?;
                tx.commit().await?;

                tracing::info!("✓ {} applied in {} ms", migration.id, duration_ms);
                report.applied.push(migration.id.clone());
            }
        }
    }

    Ok(report)
}

/// Compare migrations on disk with the ledger without applying anything.
///
/// Read-only: a database without a ledger table reports every migration as pending.
pub async fn migration_status(
    client: &Client,
    migrations: &[MigrationFile],
) -> AdminResult<Vec<MigrationStatus>> {
    let applied = if ledger::ledger_exists(client).await? {
        ledger::applied_migrations(client).await?
    } else {
        Default::default()
    };
    Ok(ledger::status(migrations, &applied))
}
