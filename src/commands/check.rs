// ABOUTME: Check command: verify the application database is reachable
// ABOUTME: Prints the server time and the tables in the public schema

use crate::config::Settings;
use crate::postgres;
use anyhow::{Context, Result};

pub async fn check(settings: &Settings) -> Result<Vec<String>> {
    let url = settings.require_database_url()?;

    tracing::info!("Testing database connection...");
    let client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;

    let now: String = client
        .query_one("SELECT NOW()::text", &[])
        .await
        .context("Failed to query server time")?
        .get(0);
    tracing::info!("✓ Connected, server time {}", now);

    let tables: Vec<String> = client
        .query(
            "SELECT table_name::text
             FROM information_schema.tables
             WHERE table_schema = 'public'
             ORDER BY table_name",
            &[],
        )
        .await
        .context("Failed to list tables")?
        .iter()
        .map(|row| row.get(0))
        .collect();

    if tables.is_empty() {
        println!("No tables in schema public. Run migrate to create them.");
    } else {
        println!("Tables in schema public ({}):", tables.len());
        for table in &tables {
            println!("  - {}", table);
        }
    }

    Ok(tables)
}
