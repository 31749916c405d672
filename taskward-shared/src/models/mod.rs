/// Database models for Taskward
///
/// # Models
///
/// - `user`: credential records, roles and the password-free `Principal`
/// - `task`: tasks, the owned resource that authorization decisions protect
///
/// Models expose plain async functions over a `PgPool`; the storage-agnostic
/// traits the auth core depends on live in [`crate::store`].

pub mod task;
pub mod user;
