// ABOUTME: CLI entry point for crm-dbadmin
// ABOUTME: Parses commands, resolves settings and routes to the command handlers

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use crm_dbadmin::config::{self, Settings, SettingsOverrides};
use crm_dbadmin::route_auth::AuthMode;
use crm_dbadmin::{commands, seed, AdminError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "crm-dbadmin")]
#[command(about = "Database administration for the Ascendore CRM", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML config file with [database] and [routes] sections
    #[arg(long, env = "CRM_ADMIN_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Superuser connection URL to a maintenance database (provision only)
    #[arg(long, env = "CRM_ADMIN_DATABASE_URL", global = true, hide_env_values = true)]
    admin_url: Option<String>,
    /// Application database connection URL
    #[arg(long, env = "CRM_DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    /// Application database name
    #[arg(long = "database", env = "CRM_DB_NAME", global = true)]
    database_name: Option<String>,
    /// Application role name
    #[arg(long, env = "CRM_DB_USER", global = true)]
    app_user: Option<String>,
    /// Application role password (provision only)
    #[arg(long, env = "CRM_DB_PASSWORD", global = true, hide_env_values = true)]
    app_password: Option<String>,
    /// Route authentication mode: enforced or dev-bypass
    #[arg(long, env = "CRM_AUTH_MODE", global = true)]
    auth_mode: Option<AuthMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate the CRM database and ensure the application role
    Provision {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Apply pending SQL migrations from a file or directory
    Migrate {
        #[arg(default_value = "migrations/002_standalone_schema.sql")]
        path: PathBuf,
    },
    /// Show which migrations are applied, pending, modified or missing
    Migrations {
        #[arg(default_value = "migrations")]
        path: PathBuf,
    },
    /// Print column layout of the CRM tables
    InspectSchema {
        /// Table to inspect (repeatable); defaults to users, companies, company_users
        #[arg(long = "table")]
        tables: Vec<String>,
    },
    /// Load the development tenant, user, customer and contact
    Seed,
    /// Hash and store a user's password
    SetPassword {
        #[arg(long, default_value = seed::DEV_USER_EMAIL)]
        email: String,
        #[arg(
            long,
            env = "CRM_DEV_PASSWORD",
            default_value = "DevPassword123!",
            hide_env_values = true,
            hide_default_value = true
        )]
        password: String,
    },
    /// Replace placeholder auth in route files with real authentication
    PatchRoutes {
        /// Directory the route file paths are relative to
        #[arg(long)]
        root: Option<PathBuf>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Verify the application database is reachable
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e
                .downcast_ref::<AdminError>()
                .map(AdminError::kind)
                .unwrap_or("internal");
            tracing::error!("❌ Error: {:#}", e);
            tracing::error!("   kind: {}", kind);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = resolve_settings(cli.global)?;
    tracing::debug!("Resolved settings: {:?}", settings);

    match cli.command {
        Commands::Provision { yes } => {
            commands::provision(&settings, yes).await?;
            println!("✅ Provisioning complete");
        }
        Commands::Migrate { path } => {
            commands::migrate(&settings, &path).await?;
            println!("✅ Migration completed successfully");
        }
        Commands::Migrations { path } => {
            commands::migration_status(&settings, &path).await?;
        }
        Commands::InspectSchema { tables } => {
            commands::inspect_schema(&settings, &tables).await?;
        }
        Commands::Seed => {
            commands::seed(&settings).await?;
            println!("✅ Seed data loaded");
        }
        Commands::SetPassword { email, password } => {
            commands::set_password(&settings, &email, &password).await?;
            println!("✅ Password set");
        }
        Commands::PatchRoutes { root, dry_run } => {
            commands::patch_routes(&settings, root.as_deref(), dry_run)?;
            println!("✅ Route authentication patch finished");
        }
        Commands::Check => {
            commands::check(&settings).await?;
            println!("✅ Database connection OK");
        }
    }

    Ok(())
}

fn resolve_settings(args: GlobalArgs) -> anyhow::Result<Settings> {
    let file = match &args.config {
        Some(path) => Some(
            config::load_file_config(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
        ),
        None => None,
    };

    let overrides = SettingsOverrides {
        admin_url: args.admin_url,
        database_url: args.database_url,
        database_name: args.database_name,
        app_user: args.app_user,
        app_password: args.app_password,
        auth_mode: args.auth_mode,
    };

    Ok(Settings::resolve(overrides, file)?)
}
