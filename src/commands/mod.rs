// ABOUTME: Command implementations, one per subcommand
// ABOUTME: Each resolves its inputs from Settings, runs the library operation and prints a summary

pub mod check;
pub mod inspect;
pub mod migrate;
pub mod patch_routes;
pub mod provision;
pub mod seed;
pub mod set_password;

pub use check::check;
pub use inspect::inspect_schema;
pub use migrate::{migrate, migration_status};
pub use patch_routes::patch_routes;
pub use provision::provision;
pub use seed::seed;
pub use set_password::set_password;
