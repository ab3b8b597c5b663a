// ABOUTME: Set-password command: hash a password and store it on a user row
// ABOUTME: The plaintext is never logged or printed

use crate::config::Settings;
use crate::password::{self, UserAccount};
use crate::postgres;
use anyhow::{Context, Result};

pub async fn set_password(settings: &Settings, email: &str, plaintext: &str) -> Result<UserAccount> {
    let url = settings.require_database_url()?;

    tracing::info!("Hashing password for {}...", email);
    let hash = password::hash_password(plaintext)?;

    let mut client = postgres::connect_with_retry(url)
        .await
        .context("Failed to connect to database")?;
    let tx = client
        .transaction()
        .await
        .context("Failed to start transaction")?;

    // NotFound propagates as-is; the transaction rolls back on drop
    let account = password::store_password_hash(&tx, email, &hash).await?;
    tx.commit().await.context("Failed to commit password change")?;

    let name = [account.first_name.as_deref(), account.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    println!("Password updated for:");
    println!("  ID:    {}", account.id);
    println!("  Email: {}", account.email);
    if !name.is_empty() {
        println!("  Name:  {}", name);
    }

    Ok(account)
}
