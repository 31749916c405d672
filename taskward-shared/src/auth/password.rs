/// Password hashing module using Argon2id
///
/// Credentials are stored only as Argon2id PHC strings. Every hash carries its
/// own random salt and parameters, so the same plaintext hashes differently on
/// each call while any hash still verifies against its original plaintext.
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use taskward_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw1")?;
///
/// assert!(verify_password("pw1", &hash));
/// assert!(!verify_password("pw2", &hash));
/// # Ok(())
/// # }
/// ```

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Hash computation failed (parameters, entropy or memory)
    #[error("Failed to hash password: {0}")]
    HashingFailure(String),
}

const MEMORY_COST_KB: u32 = 65536;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 4;
const OUTPUT_LEN: usize = 32;

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KB)
        .t_cost(TIME_COST)
        .p_cost(PARALLELISM)
        .output_len(OUTPUT_LEN)
        .build()
        .map_err(|e| PasswordError::HashingFailure(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
///
/// Returns the PHC string, e.g.
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashingFailure` only when the hasher cannot run
/// (invalid parameters, allocation failure).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailure(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a plaintext password against a stored PHC hash
///
/// The comparison is constant-time (performed by the Argon2 verifier on the
/// full output). A mismatch is `false`, never an error. A stored hash that
/// cannot be parsed also yields `false` and is logged, since it can only
/// come from a corrupted credential record.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            return false;
        }
    };

    // Parameters are embedded in the hash
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Password verification failed unexpectedly");
            false
        }
    }
}

const DECOY_PASSWORD: &str = "taskward-decoy-credential";

static DECOY_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified against on login attempts for unknown accounts
///
/// Built on first call and cached for the life of the process; only a
/// successful hash is cached, so a failure surfaces to the caller every time
/// instead of leaving logins without a decoy.
pub fn decoy_hash() -> Result<&'static str, PasswordError> {
    if let Some(hash) = DECOY_HASH.get() {
        return Ok(hash);
    }

    let hash = hash_password(DECOY_PASSWORD)?;
    Ok(DECOY_HASH.get_or_init(|| hash))
}
