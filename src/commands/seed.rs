// ABOUTME: Seed command: load the development fixture set in one transaction
// ABOUTME: Commits only after every fixture step has succeeded

use crate::config::Settings;
use crate::postgres;
use crate::seed::{self, ContactOutcome, Fixtures, SeedReport};
use anyhow::{Context, Result};

pub async fn seed(settings: &Settings) -> Result<SeedReport> {
    let url = settings.require_database_url()?;

    tracing::info!("Connecting to database...");
    let mut client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("✓ Connected");

    // Dropping the transaction without commit rolls every step back
    let mut tx = client
        .transaction()
        .await
        .context("Failed to start seed transaction")?;
    let report = seed::load_fixtures(&mut tx, &Fixtures::default())
        .await
        .context("Seeding failed, all changes rolled back")?;
    tx.commit().await.context("Failed to commit seed data")?;

    println!();
    println!("Development data ready:");
    println!("  Tenant ID: {}", report.tenant_id);
    println!("  User ID:   {}", report.user_id);
    println!("  Email:     {}", report.user_email);
    match (&report.customer_id, report.contact) {
        (Some(id), ContactOutcome::Inserted) => {
            println!("  Customer:  {} (with contact)", id)
        }
        (Some(id), _) => println!("  Customer:  {}", id),
        (None, _) => println!("  Customer:  already present, contact skipped"),
    }

    Ok(report)
}
