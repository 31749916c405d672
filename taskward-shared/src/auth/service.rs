/// Authentication service
///
/// Owns the register / login / verify-token flows. Storage and token settings
/// are injected at construction; the service keeps no other state and is
/// shared across requests behind an `Arc`.
///
/// # Login failures
///
/// An unknown username and a wrong password produce the same
/// [`AuthServiceError::InvalidCredentials`]. For an unknown username a decoy
/// Argon2 verification still runs so both paths cost about the same. The
/// decoy hash is built in [`AuthService::new`], before the first login.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskward_shared::auth::jwt::TokenSettings;
/// use taskward_shared::auth::service::AuthService;
/// use taskward_shared::store::MemoryCredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::new(
///     Arc::new(MemoryCredentialStore::new()),
///     TokenSettings::new("test-secret-key-at-least-32-bytes-long", "taskward"),
/// )?;
///
/// service.register("alice", "correct horse").await?;
/// let (token, principal) = service.login("alice", "correct horse").await?;
///
/// let claims = service.verify_token(&token)?;
/// assert_eq!(claims.user_id, principal.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use super::jwt::{Claims, TokenSettings};
use super::password::{decoy_hash, hash_password, verify_password, PasswordError};
use crate::models::user::{CreateUser, Principal, Role};
use crate::store::{CredentialStore, StoreError};

/// Error type for authentication flows
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Username already exists")]
    DuplicateLogin,

    /// Unknown username or wrong password; the two are never distinguished
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    /// Any token decode failure
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Failed to issue token: {0}")]
    TokenIssuance(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<StoreError> for AuthServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateLogin => AuthServiceError::DuplicateLogin,
            StoreError::Backend(msg) => AuthServiceError::StorageFailure(msg),
        }
    }
}

impl From<PasswordError> for AuthServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailure(msg) => AuthServiceError::HashingFailure(msg),
        }
    }
}

/// Register, login and token verification over a credential store
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: TokenSettings,
    decoy_hash: &'static str,
}

impl AuthService {
    /// Builds the service and its login decoy
    ///
    /// # Errors
    ///
    /// `HashingFailure` if the decoy hash cannot be computed. Treat this as a
    /// startup failure.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: TokenSettings,
    ) -> Result<Self, AuthServiceError> {
        Ok(Self {
            credentials,
            tokens,
            decoy_hash: decoy_hash()?,
        })
    }

    pub fn token_settings(&self) -> &TokenSettings {
        &self.tokens
    }

    /// Creates a standard account
    ///
    /// # Errors
    ///
    /// - `DuplicateLogin` if the username exists (exact match), including
    ///   when a concurrent registration wins the insert
    /// - `HashingFailure` if Argon2 cannot run
    /// - `StorageFailure` on any other store error
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthServiceError> {
        if self.credentials.find_by_username(username).await?.is_some() {
            tracing::debug!(username = %username, "Registration rejected: username taken");
            return Err(AuthServiceError::DuplicateLogin);
        }

        let password_hash = hash_password(password)?;

        // The store's uniqueness check settles races between the lookup and here
        let user = self
            .credentials
            .insert(CreateUser {
                username: username.to_string(),
                password_hash,
                role: Role::Standard,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(Principal::from(user))
    }

    /// Creates an admin account unless the username already exists
    ///
    /// Used to bootstrap the first administrator at startup. An existing
    /// account is left untouched, whatever its role.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthServiceError> {
        if let Some(existing) = self.credentials.find_by_username(username).await? {
            if !existing.role.is_admin() {
                tracing::warn!(username = %username, "Bootstrap admin exists as a standard user");
            }
            return Ok(Principal::from(existing));
        }

        let user = self
            .credentials
            .insert(CreateUser {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Admin account created");

        Ok(Principal::from(user))
    }

    /// Checks a username/password pair and issues a session token
    ///
    /// Returns the encoded token and the principal it was issued for.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, Principal), AuthServiceError> {
        let user = match self.credentials.find_by_username(username).await? {
            Some(user) => user,
            None => {
                let _ = verify_password(password, self.decoy_hash);
                tracing::debug!("Login failed");
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash) {
            tracing::debug!("Login failed");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let (token, _claims) = self
            .tokens
            .issue(&user)
            .map_err(|e| AuthServiceError::TokenIssuance(e.to_string()))?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok((token, Principal::from(user)))
    }

    /// Decodes and validates a session token
    ///
    /// All decode failures collapse into `InvalidToken`; the reason is only
    /// logged.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthServiceError> {
        self.tokens.decode(token).map_err(|e| {
            tracing::debug!(reason = %e, "Token rejected");
            AuthServiceError::InvalidToken
        })
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{encode_token, DEFAULT_ISSUER};
    use crate::store::MemoryCredentialStore;
    use chrono::Duration;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            TokenSettings::new(SECRET, DEFAULT_ISSUER),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();

        let registered = service.register("alice", "s3cret-pass").await.unwrap();
        assert_eq!(registered.username, "alice");
        assert_eq!(registered.role, Role::Standard);

        let (token, principal) = service.login("alice", "s3cret-pass").await.unwrap();
        assert_eq!(principal, registered);

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, registered.id);
        assert_eq!(claims.sub, registered.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Standard);
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let service = service();
        service.register("alice", "first-password").await.unwrap();

        let result = service.register("alice", "second-password").await;
        assert!(matches!(result, Err(AuthServiceError::DuplicateLogin)));

        // Case differs, so this is a different account
        assert!(service.register("Alice", "third-password").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register("alice", "right-password").await.unwrap();

        let wrong_password = service.login("alice", "wrong-password").await.unwrap_err();
        let unknown_user = service.login("mallory", "right-password").await.unwrap_err();

        assert!(matches!(wrong_password, AuthServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn test_decoy_ready_before_first_login() {
        let service = service();

        // A real Argon2id hash with full parameters, so an unknown-user
        // login pays the same verification cost as a wrong password
        assert!(service.decoy_hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
        assert!(!verify_password("right-password", service.decoy_hash));
    }

    #[tokio::test]
    async fn test_login_is_case_sensitive() {
        let service = service();
        service.register("alice", "right-password").await.unwrap();

        let result = service.login("ALICE", "right-password").await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_yield_one_account() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = Arc::new(AuthService::new(
            store.clone(),
            TokenSettings::new(SECRET, DEFAULT_ISSUER),
        )
        .unwrap());

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.register("bob", "password-one").await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.register("bob", "password-two").await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(AuthServiceError::DuplicateLogin)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let service = service();

        let first = service.ensure_admin("root", "admin-password").await.unwrap();
        let second = service.ensure_admin("root", "ignored").await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(first, second);

        let (_, principal) = service.login("root", "admin-password").await.unwrap();
        assert!(principal.is_admin());
    }

    #[tokio::test]
    async fn test_ensure_admin_keeps_existing_standard_user() {
        let service = service();
        service.register("alice", "alice-password").await.unwrap();

        let principal = service.ensure_admin("alice", "other").await.unwrap();
        assert_eq!(principal.role, Role::Standard);
    }

    #[test]
    fn test_verify_token_collapses_errors() {
        let service = service();

        let expired = Claims::with_expiration(
            Uuid::new_v4(),
            "alice",
            Role::Standard,
            DEFAULT_ISSUER,
            Duration::seconds(-60),
        );
        let expired = encode_token(&expired, SECRET).unwrap();

        let forged = Claims::new(Uuid::new_v4(), "alice", Role::Admin, DEFAULT_ISSUER);
        let forged = encode_token(&forged, "some-other-secret-of-enough-length").unwrap();

        let foreign = Claims::new(Uuid::new_v4(), "alice", Role::Standard, "elsewhere");
        let foreign = encode_token(&foreign, SECRET).unwrap();

        for token in [expired.as_str(), forged.as_str(), foreign.as_str(), "garbage"] {
            assert!(matches!(
                service.verify_token(token),
                Err(AuthServiceError::InvalidToken)
            ));
        }
    }

    #[test]
    fn test_error_conversions() {
        assert!(matches!(
            AuthServiceError::from(StoreError::DuplicateLogin),
            AuthServiceError::DuplicateLogin
        ));
        assert!(matches!(
            AuthServiceError::from(StoreError::Backend("down".to_string())),
            AuthServiceError::StorageFailure(_)
        ));
        assert!(matches!(
            AuthServiceError::from(PasswordError::HashingFailure("oom".to_string())),
            AuthServiceError::HashingFailure(_)
        ));
    }
}
