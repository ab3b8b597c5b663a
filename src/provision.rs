// ABOUTME: Creates the CRM database and its least-privilege application role
// ABOUTME: Drops and recreates an existing database, so every run is destructive

use crate::error::{AdminError, AdminResult};
use crate::postgres;
use crate::utils::{self, quote_ident, quote_literal, validate_postgres_identifier};
use tokio_postgres::Client;

pub struct ProvisionRequest<'a> {
    /// Superuser URL pointing at a maintenance database (usually `postgres`).
    pub admin_url: &'a str,
    pub database: &'a str,
    pub app_user: &'a str,
    pub app_password: &'a str,
}

impl std::fmt::Debug for ProvisionRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionRequest")
            .field("admin_url", &utils::redact_url(self.admin_url))
            .field("database", &self.database)
            .field("app_user", &self.app_user)
            .field("app_password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub dropped_existing: bool,
    pub terminated_connections: i64,
    pub role_created: bool,
}

/// Provision the database and role.
///
/// **Destructive:** when the database already exists every other session on it is
/// terminated and the database is dropped. `confirm_drop` is called with the
/// database name before that happens; returning an error aborts without changes.
///
/// The role is created only if missing, so re-running leaves a single role.
pub async fn provision<F>(request: &ProvisionRequest<'_>, confirm_drop: F) -> AdminResult<ProvisionReport>
where
    F: FnOnce(&str) -> AdminResult<()>,
{
    validate_postgres_identifier(request.database)?;
    validate_postgres_identifier(request.app_user)?;
    if request.app_password.is_empty() {
        return Err(AdminError::malformed("Application role password cannot be empty"));
    }

    let maintenance_db = utils::database_name_from_url(request.admin_url)?;
    if maintenance_db == request.database {
        return Err(AdminError::malformed(format!(
            "Admin URL points at '{}', the database being recreated. \
             Connect the admin URL to a maintenance database such as 'postgres'.",
            maintenance_db
        )));
    }

    let mut report = ProvisionReport::default();

    {
        let admin = postgres::connect_with_retry(request.admin_url).await?;

        if database_exists(&admin, request.database).await? {
            tracing::warn!(
                "⚠ Database '{}' already exists and will be DROPPED with all of its data",
                request.database
            );
            confirm_drop(request.database)?;

            report.terminated_connections = terminate_connections(&admin, request.database).await?;
            tracing::info!(
                "Terminated {} connection(s) to '{}'",
                report.terminated_connections,
                request.database
            );
            admin
                .batch_execute(&drop_database_sql(request.database))
                .await?;
            report.dropped_existing = true;
            tracing::info!("✓ Dropped existing database '{}'", request.database);
        }

        tracing::info!("Creating database '{}'...", request.database);
        admin
            .batch_execute(&format!("CREATE DATABASE {}", quote_ident(request.database)))
            .await?;
        tracing::info!("✓ Database '{}' created", request.database);

        if role_exists(&admin, request.app_user).await? {
            tracing::info!("✓ Role '{}' already exists", request.app_user);
        } else {
            tracing::info!("Creating role '{}'...", request.app_user);
            admin
                .batch_execute(&format!(
                    "CREATE USER {} WITH PASSWORD {}",
                    quote_ident(request.app_user),
                    quote_literal(request.app_password)
                ))
                .await?;
            report.role_created = true;
            tracing::info!("✓ Role '{}' created", request.app_user);
        }

        admin
            .batch_execute(&format!(
                "GRANT ALL PRIVILEGES ON DATABASE {} TO {}",
                quote_ident(request.database),
                quote_ident(request.app_user)
            ))
            .await?;
    }

    tracing::info!("Granting schema privileges to '{}'...", request.app_user);
    let target_url = utils::replace_database_in_url(request.admin_url, request.database)?;
    let target = postgres::connect_with_retry(&target_url).await?;
    target
        .batch_execute(&schema_grant_sql(request.app_user))
        .await?;
    tracing::info!("✓ All privileges granted");

    Ok(report)
}

pub async fn database_exists(client: &Client, database: &str) -> AdminResult<bool> {
    let row = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&database])
        .await?;
    Ok(row.is_some())
}

pub async fn role_exists(client: &Client, role: &str) -> AdminResult<bool> {
    let row = client
        .query_opt("SELECT 1 FROM pg_roles WHERE rolname = $1", &[&role])
        .await?;
    Ok(row.is_some())
}

/// Terminate every other backend connected to `database`; returns how many were signalled.
pub async fn terminate_connections(client: &Client, database: &str) -> AdminResult<i64> {
    let row = client
        .query_one(
            "SELECT count(pg_terminate_backend(pid))
             FROM pg_stat_activity
             WHERE datname = $1 AND pid <> pg_backend_pid()",
            &[&database],
        )
        .await?;
    Ok(row.get(0))
}

/// `WITH (FORCE)` (PostgreSQL 13+) also ends sessions that reconnect after the terminate.
pub fn drop_database_sql(database: &str) -> String {
    format!("DROP DATABASE {} WITH (FORCE)", quote_ident(database))
}

/// Privileges on the default schema, its tables and its sequences.
pub fn schema_grant_sql(role: &str) -> String {
    let role = quote_ident(role);
    format!(
        "GRANT ALL ON SCHEMA public TO {role};\n\
         GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO {role};\n\
         GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO {role};"
    )
}

/// Connection string for the application role, password redacted.
pub fn app_connection_string(admin_url: &str, request: &ProvisionRequest<'_>) -> AdminResult<String> {
    let without_scheme = admin_url
        .trim_start_matches("postgresql://")
        .trim_start_matches("postgres://");
    let host_and_db = without_scheme
        .rsplit_once('@')
        .map(|(_, rest)| rest)
        .unwrap_or(without_scheme);
    let host = host_and_db
        .split_once('/')
        .map(|(host, _)| host)
        .ok_or_else(|| AdminError::malformed("Admin URL is missing a database name"))?;
    Ok(format!(
        "postgresql://{}:***@{}/{}",
        request.app_user, host, request.database
    ))
}
