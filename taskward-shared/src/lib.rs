//! # Taskward Shared Library
//!
//! Authentication and authorization core of the Taskward API, plus the
//! models and storage it runs over.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, tokens, the authentication service, the ownership
//!   policy and the Axum request gate
//! - `models`: users and tasks with their PostgreSQL queries
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `db`: connection pool and embedded migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Taskward shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
