// ABOUTME: Patch-routes command: rewrite legacy placeholder auth in route files
// ABOUTME: Reports per-file outcomes and any placeholders the rules could not remove

use crate::config::Settings;
use crate::route_auth::{self, FileReport, PatchOutcome, RouteAuthPolicy};
use anyhow::{Context, Result};
use std::path::Path;

/// Patch the configured route files under `root` (or the configured root).
pub fn patch_routes(settings: &Settings, root: Option<&Path>, dry_run: bool) -> Result<Vec<FileReport>> {
    let policy = RouteAuthPolicy::new(settings.auth_mode);
    tracing::info!("Runtime auth mode: {}", policy.mode());
    if !policy.requires_role_check() {
        tracing::warn!("⚠ Organization role checks are skipped in this mode");
    }

    let root = root.unwrap_or(settings.routes_root.as_path());
    tracing::info!("Enabling authentication in route files under {}", root.display());

    let reports = route_auth::patch_route_files(root, &settings.route_files, dry_run)
        .with_context(|| format!("Failed to patch route files under {}", root.display()))?;

    let count = |outcome: PatchOutcome| reports.iter().filter(|r| r.outcome == outcome).count();
    let drifted = reports.iter().filter(|r| !r.leftovers.is_empty()).count();

    println!();
    println!(
        "{} updated, {} unchanged, {} missing{}",
        count(PatchOutcome::Updated),
        count(PatchOutcome::Unchanged),
        count(PatchOutcome::Missing),
        if dry_run { " (dry run, nothing written)" } else { "" }
    );
    if drifted > 0 {
        println!("{} file(s) still contain placeholder auth; review them by hand", drifted);
    }

    Ok(reports)
}
