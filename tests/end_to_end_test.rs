// ABOUTME: End-to-end tests against a disposable PostgreSQL cluster
// ABOUTME: Provision, migrate, seed, set a password and inspect the result

use crm_dbadmin::config::{Settings, SettingsOverrides};
use crm_dbadmin::seed::{ContactOutcome, DEV_USER_EMAIL};
use crm_dbadmin::{commands, password, postgres};
use std::env;
use std::path::Path;

const TEST_DATABASE: &str = "crm_dbadmin_e2e";
const TEST_ROLE: &str = "crm_dbadmin_e2e_role";

/// Helper to get the superuser URL from environment
fn get_test_admin_url() -> String {
    env::var("TEST_ADMIN_URL").expect("TEST_ADMIN_URL must point at a maintenance database")
}

fn settings(admin_url: &str) -> Settings {
    let database_url =
        crm_dbadmin::utils::replace_database_in_url(admin_url, TEST_DATABASE).unwrap();
    Settings::resolve(
        SettingsOverrides {
            admin_url: Some(admin_url.to_string()),
            database_url: Some(database_url),
            database_name: Some(TEST_DATABASE.to_string()),
            app_user: Some(TEST_ROLE.to_string()),
            app_password: Some("e2e_password".to_string()),
            auth_mode: None,
        },
        None,
    )
    .unwrap()
}

// NOTE: Drops and recreates crm_dbadmin_e2e on the target cluster
#[tokio::test]
#[ignore]
async fn test_full_admin_workflow() {
    let admin_url = get_test_admin_url();
    let settings = settings(&admin_url);
    let migrations = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");

    commands::provision(&settings, true).await.unwrap();
    let report = commands::provision(&settings, true).await.unwrap();
    assert!(report.dropped_existing);
    assert!(!report.role_created);

    let first = commands::migrate(&settings, &migrations).await.unwrap();
    assert_eq!(
        first.applied,
        vec!["002_standalone_schema.sql", "003_add_password_hash.sql"]
    );
    let second = commands::migrate(&settings, &migrations).await.unwrap();
    assert!(second.applied.is_empty());

    let seeded = commands::seed(&settings).await.unwrap();
    assert!(seeded.membership_created);
    assert_eq!(seeded.contact, ContactOutcome::Inserted);

    let reseeded = commands::seed(&settings).await.unwrap();
    assert!(!reseeded.membership_created);
    assert_eq!(reseeded.customer_id, None);
    assert_eq!(reseeded.contact, ContactOutcome::SkippedNoParent);

    let client = postgres::connect(settings.database_url.as_deref().unwrap())
        .await
        .unwrap();
    for (table, expected) in [
        ("companies", 1i64),
        ("users", 1),
        ("company_users", 1),
        ("crm_companies", 1),
        ("crm_contacts", 1),
    ] {
        let count: i64 = client
            .query_one(&format!("SELECT COUNT(*) FROM public.{}", table), &[])
            .await
            .unwrap()
            .get(0);
        assert_eq!(count, expected, "row count for {}", table);
    }

    let account = commands::set_password(&settings, DEV_USER_EMAIL, "DevPassword123!")
        .await
        .unwrap();
    assert_eq!(account.email, DEV_USER_EMAIL);

    let stored: String = client
        .query_one(
            "SELECT password_hash FROM public.users WHERE email = $1",
            &[&DEV_USER_EMAIL],
        )
        .await
        .unwrap()
        .get(0);
    assert!(password::verify_password("DevPassword123!", &stored).unwrap());

    commands::set_password(&settings, DEV_USER_EMAIL, "DevPassword123!")
        .await
        .unwrap();
    let rehashed: String = client
        .query_one(
            "SELECT password_hash FROM public.users WHERE email = $1",
            &[&DEV_USER_EMAIL],
        )
        .await
        .unwrap()
        .get(0);
    assert_ne!(stored, rehashed);

    let schemas = commands::inspect_schema(&settings, &[]).await.unwrap();
    let users = schemas.iter().find(|s| s.table == "users").unwrap();
    let hash_column = users
        .columns
        .iter()
        .find(|c| c.name == "password_hash")
        .unwrap();
    assert_eq!(hash_column.data_type, "character varying");
    assert_eq!(hash_column.max_length, Some(255));
    assert_eq!(users.columns[0].name, "id");

    let tables = commands::check(&settings).await.unwrap();
    assert!(tables.contains(&"schema_migrations".to_string()));

    let err = commands::set_password(&settings, "nobody@ascendore.local", "whatever")
        .await
        .unwrap_err();
    let admin_err = err.downcast_ref::<crm_dbadmin::AdminError>().unwrap();
    assert_eq!(admin_err.kind(), "not_found");
    assert!(err.to_string().contains("User not found: nobody@ascendore.local"));
}
