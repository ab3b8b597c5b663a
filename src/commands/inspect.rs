// ABOUTME: Inspect-schema command
// ABOUTME: Prints the column layout of the CRM tables to stdout

use crate::config::Settings;
use crate::inspect::{self, TableSchema, DEFAULT_TABLES};
use crate::postgres;
use anyhow::{Context, Result};

/// Inspect `tables`, or the default user/tenant tables when empty.
pub async fn inspect_schema(settings: &Settings, tables: &[String]) -> Result<Vec<TableSchema>> {
    let url = settings.require_database_url()?;
    let tables: Vec<String> = if tables.is_empty() {
        DEFAULT_TABLES.iter().map(|t| t.to_string()).collect()
    } else {
        tables.to_vec()
    };

    let client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;

    let schemas = inspect::inspect_tables(&client, &tables).await?;
    println!("{}", inspect::render_tables(&schemas));
    Ok(schemas)
}
