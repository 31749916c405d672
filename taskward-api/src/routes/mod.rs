/// API route handlers
///
/// - `health`: liveness and storage check
/// - `auth`: register, login, profile
/// - `tasks`: task CRUD for the caller, checked against the ownership policy
/// - `admin`: unfiltered listings for administrators

pub mod admin;
pub mod auth;
pub mod health;
pub mod tasks;
