// ABOUTME: PostgreSQL connectivity for the admin operations
// ABOUTME: Re-exports connection helpers used by every command

pub mod connection;

pub use connection::{connect, connect_with_retry};
