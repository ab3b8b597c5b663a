// ABOUTME: One-time rewrite of legacy route files that still hard-code dev identities
// ABOUTME: Re-enables authenticate middleware and swaps placeholder ids for request context

use crate::error::{AdminError, AdminResult};
use regex::{NoExpand, Regex};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const AUTH_MARKER: &str = "// TODO: Re-enable auth";
const ROLE_MARKER: &str = "// TODO: Re-enable role check";
const COMMENTED_ROLE: &str = "// requireOrganizationRole(";
const COMPANY_PLACEHOLDER: &str = "DEV_COMPANY_ID";
const USER_PLACEHOLDER: &str = "DEV_USER_ID";
const COMPANY_FROM_REQUEST: &str = "req.user!.organization!.id";
const USER_FROM_REQUEST: &str = "req.user!.id";

static DEV_CONSTANTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"// Dev mode: Mock company ID\s*\nconst DEV_COMPANY_ID = '[^']+';(\s*\nconst DEV_USER_ID = '[^']+';)?",
    )
    .expect("dev constant pattern is valid")
});

static COMMENTED_USE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"// TODO: Re-enable auth after Phase 3\s*\n(?:// TODO: Re-enable auth after Phase 3\s*\n)?// // (\w+Router)\.use\(authenticate\);?",
    )
    .expect("commented middleware pattern is valid")
});

static COMMENTED_ROLE_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^([ \t]*)// TODO: Re-enable role check after Phase 3[ \t]*\r?\n[ \t]*// (requireOrganizationRole\([^)]*\),?)",
    )
    .expect("commented role check pattern is valid")
});

static ROUTER_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export const (\w+Router) = Router\(\);").expect("router pattern is valid")
});

static MARKER_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"// TODO: Re-enable auth.*?\n(?:// .*?\n)*").expect("marker block pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Updated,
    /// Content already matched the patched form ("no changes needed").
    Unchanged,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: PatchOutcome,
    /// Placeholder tokens or markers still present after patching.
    pub leftovers: Vec<&'static str>,
}

/// Apply the rewrite rules to one file's content, in order:
///
/// 1. drop the `DEV_COMPANY_ID` / `DEV_USER_ID` constant declarations
/// 2. uncomment `// // xRouter.use(authenticate)` behind the Phase 3 marker
/// 3. uncomment `// requireOrganizationRole(...)` behind the role-check marker
/// 4. replace any remaining auth marker block with a fresh `xRouter.use(authenticate);`
/// 5. swap placeholder ids for the authenticated request's ids
///
/// Applying it to its own output returns the input unchanged.
pub fn patch_route_source(content: &str) -> String {
    let mut patched = DEV_CONSTANTS.replace_all(content, "").into_owned();
    patched = COMMENTED_USE
        .replace_all(&patched, "${1}.use(authenticate);")
        .into_owned();
    patched = COMMENTED_ROLE_CHECK
        .replace_all(&patched, "${1}${2}")
        .into_owned();

    if patched.contains(AUTH_MARKER) {
        let router = ROUTER_DECLARATION
            .captures(&patched)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        if let Some(router) = router {
            let registration = format!(
                "\n// Enable authentication for all routes\n{}.use(authenticate);\n",
                router
            );
            patched = MARKER_BLOCK
                .replace_all(&patched, NoExpand(&registration))
                .into_owned();
        }
    }

    patched
        .replace(COMPANY_PLACEHOLDER, COMPANY_FROM_REQUEST)
        .replace(USER_PLACEHOLDER, USER_FROM_REQUEST)
}

/// Tokens that indicate the file drifted from the shapes the rules know about.
pub fn leftover_placeholders(content: &str) -> Vec<&'static str> {
    [
        AUTH_MARKER,
        ROLE_MARKER,
        COMMENTED_ROLE,
        COMPANY_PLACEHOLDER,
        USER_PLACEHOLDER,
    ]
        .into_iter()
        .filter(|token| content.contains(token))
        .collect()
}

/// Patch each file under `root`, writing back only files whose content changed.
///
/// Missing files are reported and skipped. With `dry_run` nothing is written.
pub fn patch_route_files(
    root: &Path,
    files: &[PathBuf],
    dry_run: bool,
) -> AdminResult<Vec<FileReport>> {
    let mut reports = Vec::with_capacity(files.len());

    for relative in files {
        let path = root.join(relative);
        tracing::info!("Processing: {}", relative.display());

        if !path.is_file() {
            tracing::warn!("  ⚠ File not found, skipping");
            reports.push(FileReport {
                path,
                outcome: PatchOutcome::Missing,
                leftovers: Vec::new(),
            });
            continue;
        }

        let original = fs::read_to_string(&path)?;
        let patched = patch_route_source(&original);
        let leftovers = leftover_placeholders(&patched);

        let outcome = if patched == original {
            tracing::info!("  No changes needed");
            PatchOutcome::Unchanged
        } else {
            if dry_run {
                tracing::info!("  Would update (dry run)");
            } else {
                write_atomically(&path, &patched)?;
                tracing::info!("  ✓ Updated");
            }
            PatchOutcome::Updated
        };

        if !leftovers.is_empty() {
            tracing::warn!(
                "  ⚠ Still contains {} after patching; the file no longer matches the known layout",
                leftovers.join(", ")
            );
        }

        reports.push(FileReport {
            path,
            outcome,
            leftovers,
        });
    }

    Ok(reports)
}

fn write_atomically(path: &Path, content: &str) -> AdminResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| {
        AdminError::Io(std::io::Error::new(
            e.error.kind(),
            format!("Failed to replace {}: {}", path.display(), e.error),
        ))
    })?;
    Ok(())
}
