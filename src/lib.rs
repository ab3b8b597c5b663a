// ABOUTME: Library module for crm-dbadmin
// ABOUTME: Exports the CRM database admin operations for use in the binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod inspect;
pub mod interactive;
pub mod migration;
pub mod password;
pub mod postgres;
pub mod provision;
pub mod route_auth;
pub mod seed;
pub mod utils;

pub use error::{AdminError, AdminResult};
