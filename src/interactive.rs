// ABOUTME: Interactive confirmation for destructive operations
// ABOUTME: Prompts on a terminal and refuses to guess when there is none

use crate::error::{AdminError, AdminResult};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::io::IsTerminal;

/// Ask before dropping `database`.
///
/// Declining, or running without a terminal, returns [`AdminError::Confirmation`].
/// Pass `--yes` to skip the prompt in scripts.
pub fn confirm_drop_database(database: &str) -> AdminResult<()> {
    if !std::io::stdin().is_terminal() {
        return Err(AdminError::Confirmation(format!(
            "Refusing to drop '{}' without confirmation: stdin is not a terminal. Re-run with --yes",
            database
        )));
    }

    println!();
    println!("========================================");
    println!("Database '{}' already exists.", database);
    println!("Provisioning drops it and ALL of its data.");
    println!("========================================");
    println!();

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Drop and recreate '{}'?", database))
        .default(false)
        .interact()
        .map_err(|e| AdminError::Confirmation(format!("Failed to get confirmation: {}", e)))?;

    if !confirmed {
        tracing::warn!("⚠ User cancelled operation");
        return Err(AdminError::Confirmation(format!(
            "Kept existing database '{}'",
            database
        )));
    }

    tracing::info!("✓ Drop confirmed");
    Ok(())
}
