// ABOUTME: Discovers SQL migration files on disk and fingerprints their contents
// ABOUTME: Orders migrations lexicographically by file name and checksums them with SHA-256

use crate::error::{AdminError, AdminResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A migration read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// File name, e.g. `002_standalone_schema.sql`. Used as the ledger key.
    pub id: String,
    pub path: PathBuf,
    pub sql: String,
    /// Lowercase hex SHA-256 of `sql`.
    pub checksum: String,
}

pub fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Read one migration file.
///
/// # Errors
///
/// - [`AdminError::FileNotFound`] when the path does not exist
/// - [`AdminError::MalformedInput`] when the name is not valid UTF-8 or the file
///   contains nothing but whitespace and `--` comments
pub fn load_migration(path: &Path) -> AdminResult<MigrationFile> {
    if !path.is_file() {
        return Err(AdminError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let id = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AdminError::malformed(format!("Invalid migration file name: {}", path.display()))
        })?
        .to_string();

    let sql = fs::read_to_string(path)?;
    if is_effectively_empty(&sql) {
        return Err(AdminError::malformed(format!(
            "Migration {} contains no SQL statements",
            id
        )));
    }

    if has_transaction_control(&sql) {
        tracing::warn!(
            "⚠ Migration {} contains its own BEGIN/COMMIT; statements after the COMMIT are not covered by the runner's transaction",
            id
        );
    }

    let checksum = compute_checksum(&sql);
    Ok(MigrationFile {
        id,
        path: path.to_path_buf(),
        sql,
        checksum,
    })
}

/// Load the migrations at `path`.
///
/// A file yields exactly that migration. A directory yields every `*.sql` file
/// directly inside it, sorted by file name so numeric prefixes define the order.
pub fn discover_migrations(path: &Path) -> AdminResult<Vec<MigrationFile>> {
    if path.is_file() {
        return Ok(vec![load_migration(path)?]);
    }
    if !path.is_dir() {
        return Err(AdminError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_sql = entry_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if entry_path.is_file() && is_sql {
            paths.push(entry_path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    paths.iter().map(|p| load_migration(p)).collect()
}

fn is_effectively_empty(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

fn has_transaction_control(sql: &str) -> bool {
    sql.lines().map(str::trim).any(|line| {
        let upper = line.to_ascii_uppercase();
        upper == "BEGIN;" || upper.starts_with("BEGIN TRANSACTION") || upper == "COMMIT;"
    })
}
