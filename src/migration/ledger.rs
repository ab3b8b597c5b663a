// ABOUTME: Persistent ledger of applied schema migrations
// ABOUTME: Plans which migrations to apply and reports status against the ledger

use crate::error::{AdminError, AdminResult};
use crate::migration::files::MigrationFile;
use std::collections::BTreeMap;
use tokio_postgres::{Client, GenericClient};

pub const LEDGER_TABLE: &str = "schema_migrations";

/// Session advisory lock key serializing concurrent migration runs.
pub const MIGRATION_LOCK_KEY: i64 = 0x0A5C_E2D0_C2B1;

const INIT_SQL: &str = "
CREATE TABLE IF NOT EXISTS public.schema_migrations (
    id VARCHAR(255) PRIMARY KEY,
    checksum VARCHAR(64) NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    duration_ms BIGINT NOT NULL DEFAULT 0
);
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub id: String,
    pub checksum: String,
    pub applied_at: String,
    pub duration_ms: i64,
}

/// What the runner will do with one migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedStep<'a> {
    Apply(&'a MigrationFile),
    AlreadyApplied(&'a MigrationFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    Applied { applied_at: String },
    Pending,
    /// The file changed after it was applied.
    Modified,
    /// Recorded in the ledger but no longer on disk.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: String,
    pub state: MigrationState,
}

pub async fn ensure_ledger(client: &Client) -> AdminResult<()> {
    client.batch_execute(INIT_SQL).await?;
    Ok(())
}

pub async fn ledger_exists(client: &Client) -> AdminResult<bool> {
    let row = client
        .query_one(
            "SELECT to_regclass('public.schema_migrations') IS NOT NULL",
            &[],
        )
        .await?;
    Ok(row.get(0))
}

/// Read the ledger keyed by migration id.
pub async fn applied_migrations(client: &Client) -> AdminResult<BTreeMap<String, AppliedMigration>> {
    let rows = client
        .query(
            "SELECT id, checksum, applied_at::text, duration_ms
             FROM public.schema_migrations
             ORDER BY id",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let applied = AppliedMigration {
                id: row.get(0),
                checksum: row.get(1),
                applied_at: row.get(2),
                duration_ms: row.get(3),
            };
            (applied.id.clone(), applied)
        })
        .collect())
}

/// Record a migration inside the transaction that applied it.
pub async fn record_applied<C: GenericClient>(
    client: &C,
    migration: &MigrationFile,
    duration_ms: i64,
) -> AdminResult<()> {
    client
        .execute(
            "INSERT INTO public.schema_migrations (id, checksum, duration_ms)
             VALUES ($1, $2, $3)",
            &[&migration.id, &migration.checksum, &duration_ms],
        )
        .await?;
    Ok(())
}

/// Decide, in file order, which migrations to apply.
///
/// Fails before anything is applied if an already-applied migration's checksum
/// no longer matches its file.
pub fn plan<'a>(
    files: &'a [MigrationFile],
    applied: &BTreeMap<String, AppliedMigration>,
) -> AdminResult<Vec<PlannedStep<'a>>> {
    files
        .iter()
        .map(|file| match applied.get(&file.id) {
            None => Ok(PlannedStep::Apply(file)),
            Some(record) if record.checksum == file.checksum => {
                Ok(PlannedStep::AlreadyApplied(file))
            }
            Some(record) => Err(AdminError::ChecksumMismatch {
                id: file.id.clone(),
                expected: record.checksum.clone(),
                actual: file.checksum.clone(),
            }),
        })
        .collect()
}

/// Status of every migration on disk plus ledger entries whose file is gone.
pub fn status(
    files: &[MigrationFile],
    applied: &BTreeMap<String, AppliedMigration>,
) -> Vec<MigrationStatus> {
    let mut statuses: Vec<MigrationStatus> = files
        .iter()
        .map(|file| {
            let state = match applied.get(&file.id) {
                None => MigrationState::Pending,
                Some(record) if record.checksum == file.checksum => MigrationState::Applied {
                    applied_at: record.applied_at.clone(),
                },
                Some(_) => MigrationState::Modified,
            };
            MigrationStatus {
                id: file.id.clone(),
                state,
            }
        })
        .collect();

    for id in applied.keys() {
        if !files.iter().any(|f| &f.id == id) {
            statuses.push(MigrationStatus {
                id: id.clone(),
                state: MigrationState::Missing,
            });
        }
    }

    statuses.sort_by(|a, b| a.id.cmp(&b.id));
    statuses
}
