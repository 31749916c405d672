/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 session token codec
/// - [`service`]: register / login / verify-token flows
/// - [`authorization`]: ownership and role policy
/// - [`middleware`]: Axum request gate and admin gate
///
/// # Security Properties
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations, random salt
/// - **Tokens**: HS256 only, 24 hour lifetime, zero clock leeway
/// - **Login**: unknown user and wrong password are indistinguishable
/// - **Resources**: non-admins cannot tell "missing" from "not yours"
///
/// # Example
///
/// ```
/// use taskward_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash));
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
