// ABOUTME: Provision command: recreate the CRM database and ensure the application role
// ABOUTME: Confirms before dropping an existing database unless --yes is given

use crate::config::Settings;
use crate::interactive;
use crate::provision::{self, ProvisionReport, ProvisionRequest};
use crate::utils;
use anyhow::{Context, Result};

pub async fn provision(settings: &Settings, skip_confirmation: bool) -> Result<ProvisionReport> {
    let admin_url = settings.require_admin_url()?;
    let app_password = settings.require_app_password()?;

    tracing::info!("Starting database provisioning...");
    tracing::info!("  Admin connection: {}", utils::redact_url(admin_url));
    tracing::info!("  Database: {}", settings.database_name);
    tracing::info!("  Application role: {}", settings.app_user);

    let request = ProvisionRequest {
        admin_url,
        database: &settings.database_name,
        app_user: &settings.app_user,
        app_password,
    };

    let report = provision::provision(&request, |database| {
        if skip_confirmation {
            tracing::info!("Skipping confirmation (--yes)");
            Ok(())
        } else {
            interactive::confirm_drop_database(database)
        }
    })
    .await
    .with_context(|| format!("Failed to provision database '{}'", settings.database_name))?;

    let app_url = provision::app_connection_string(admin_url, &request)?;

    println!();
    println!("Database setup complete!");
    println!();
    println!("Connection details:");
    println!("  Database: {}", settings.database_name);
    println!("  User:     {}", settings.app_user);
    println!("  Password: ***");
    println!("  URL:      {}", app_url);
    println!();
    println!("Set CRM_DATABASE_URL to this URL (with the real password) before running migrate.");

    Ok(report)
}
