/// JWT token codec
///
/// Session tokens are compact JWS strings (`header.payload.signature`) signed
/// with HMAC-SHA256 over `header.payload` using the process-wide secret.
/// Tokens are self-contained: nothing is stored server-side, and a token dies
/// at its `exp` or when the signing secret changes.
///
/// # Validation
///
/// [`decode_token`] recomputes the signature and rejects:
///
/// | Condition | Error |
/// |---|---|
/// | not three base64url parts / bad JSON | [`TokenError::Malformed`] |
/// | signature mismatch | [`TokenError::InvalidSignature`] |
/// | header `alg` other than HS256 | [`TokenError::UnsupportedAlgorithm`] |
/// | `now > exp` | [`TokenError::Expired`] |
/// | `now < nbf` | [`TokenError::NotYetValid`] |
///
/// No clock leeway is applied. Issuer checks are done by
/// [`TokenSettings::decode`].
///
/// # Example
///
/// ```
/// use taskward_shared::auth::jwt::{decode_token, encode_token, Claims};
/// use taskward_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "alice", Role::Standard, "taskward");
/// let token = encode_token(&claims, "test-secret-key-at-least-32-bytes-long")?;
///
/// let decoded = decode_token(&token, "test-secret-key-at-least-32-bytes-long")?;
/// assert_eq!(decoded, claims);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Principal, Role, User};

/// The only signing algorithm issued or accepted
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Fixed token lifetime
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Issuer used when none is configured
pub const DEFAULT_ISSUER: &str = "taskward";

/// Error type for token encoding and decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Claims could not be serialized or signed
    #[error("Failed to create token: {0}")]
    Encoding(String),

    /// Structure, base64 or JSON could not be parsed
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Recomputed signature does not match
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Header declares an algorithm other than HS256
    #[error("Unsupported signing algorithm")]
    UnsupportedAlgorithm,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    /// Issued by someone other than the configured issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// JWT claims
///
/// # Standard Claims
///
/// - `iss`: issuer (configured, default "taskward")
/// - `sub`: subject, the user ID as a string
/// - `iat` / `nbf` / `exp`: Unix timestamps (seconds)
///
/// # Custom Claims
///
/// - `user_id`, `username`, `role`: identity at the moment of issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,

    pub username: String,

    pub role: Role,

    pub iss: String,

    pub sub: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    /// Claims valid from now for [`TOKEN_TTL_HOURS`]
    pub fn new(user_id: Uuid, username: &str, role: Role, issuer: &str) -> Self {
        Self::with_expiration(
            user_id,
            username,
            role,
            issuer,
            Duration::hours(TOKEN_TTL_HOURS),
        )
    }

    /// Claims valid from now for a custom duration (negative = already expired)
    pub fn with_expiration(
        user_id: Uuid,
        username: &str,
        role: Role,
        issuer: &str,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id,
            username: username.to_string(),
            role,
            iss: issuer.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Claims reflecting a credential record as it is right now
    pub fn for_user(user: &User, issuer: &str) -> Self {
        Self::new(user.id, &user.username, user.role, issuer)
    }

    /// The principal this token speaks for
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.user_id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Signs claims into a compact token
///
/// Deterministic: identical claims and secret give an identical string.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(ALGORITHM);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verifies a compact token and returns its claims
///
/// Signature and algorithm are checked before any claim is trusted.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Signing secret and issuer, fixed at startup
///
/// Never mutated after construction; shared read-only across requests.
#[derive(Clone)]
pub struct TokenSettings {
    secret: String,
    issuer: String,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a token for a credential record
    pub fn issue(&self, user: &User) -> Result<(String, Claims), TokenError> {
        let claims = Claims::for_user(user, &self.issuer);
        let token = encode_token(&claims, &self.secret)?;
        Ok((token, claims))
    }

    /// Decodes a token and checks that it was issued by us
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode_token(token, &self.secret)?;

        if claims.iss != self.issuer {
            return Err(TokenError::InvalidIssuer);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn claims() -> Claims {
        Claims::new(Uuid::new_v4(), "alice", Role::Standard, DEFAULT_ISSUER)
    }

    fn claims_with_window(nbf_offset: i64, exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        let user_id = Uuid::new_v4();

        Claims {
            user_id,
            username: "alice".to_string(),
            role: Role::Standard,
            iss: DEFAULT_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            nbf: now + nbf_offset,
            exp: now + exp_offset,
        }
    }

    /// Replaces the character at `index` with a different base64url character
    fn flip_char(token: &str, index: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice", Role::Admin, "issuer-x");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, "issuer-x");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_round_trip() {
        let claims = claims();
        let token = encode_token(&claims, SECRET).expect("Should create token");

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(decode_token(&token, SECRET).unwrap(), claims);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let claims = claims();

        assert_eq!(
            encode_token(&claims, SECRET).unwrap(),
            encode_token(&claims, SECRET).unwrap()
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = encode_token(&claims(), "secret-one-secret-one-secret-one").unwrap();

        assert_eq!(
            decode_token(&token, "secret-two-secret-two-secret-two"),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_or_signature_never_verifies() {
        let token = encode_token(&claims(), SECRET).unwrap();
        let payload_start = token.find('.').unwrap() + 1;

        for index in payload_start..token.len() {
            if token.as_bytes()[index] == b'.' {
                continue;
            }

            let tampered = flip_char(&token, index);
            match decode_token(&tampered, SECRET) {
                Err(TokenError::InvalidSignature) | Err(TokenError::Malformed(_)) => {}
                other => panic!("tampering at {} gave {:?}", index, other),
            }
        }
    }

    #[test]
    fn test_malformed_structure() {
        for garbage in ["", "not-a-token", "a.b", "a.b.c", "a.b.c.d"] {
            assert!(
                matches!(decode_token(garbage, SECRET), Err(TokenError::Malformed(_))),
                "'{}' should be malformed",
                garbage
            );
        }
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = claims();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            decode_token(&token, SECRET),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let token = encode_token(&claims(), SECRET).unwrap();
        let mut parts = token.split('.');
        let _header = parts.next().unwrap();
        let payload = parts.next().unwrap();

        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);

        assert!(matches!(
            decode_token(&unsigned, SECRET),
            Err(TokenError::Malformed(_)) | Err(TokenError::UnsupportedAlgorithm)
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let expired = encode_token(&claims_with_window(-10, -1), SECRET).unwrap();
        let fresh = encode_token(&claims_with_window(-10, 1), SECRET).unwrap();

        assert_eq!(decode_token(&expired, SECRET), Err(TokenError::Expired));
        assert!(decode_token(&fresh, SECRET).is_ok());
    }

    #[test]
    fn test_long_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "alice",
            Role::Standard,
            DEFAULT_ISSUER,
            Duration::seconds(-3600),
        );

        let token = encode_token(&claims, SECRET).unwrap();
        assert_eq!(decode_token(&token, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn test_not_yet_valid() {
        let token = encode_token(&claims_with_window(60, 3600), SECRET).unwrap();

        assert_eq!(decode_token(&token, SECRET), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_settings_check_issuer() {
        let ours = TokenSettings::new(SECRET, "taskward");
        let theirs = TokenSettings::new(SECRET, "someone-else");

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: String::new(),
            role: Role::Standard,
            created_at: now,
            updated_at: now,
        };

        let (token, issued) = theirs.issue(&user).unwrap();
        assert_eq!(issued.iss, "someone-else");
        assert_eq!(ours.decode(&token), Err(TokenError::InvalidIssuer));

        let (token, _) = ours.issue(&user).unwrap();
        let decoded = ours.decode(&token).unwrap();
        assert_eq!(decoded.principal(), Principal::from(&user));
    }

    #[test]
    fn test_settings_debug_redacts_secret() {
        let settings = TokenSettings::new(SECRET, "taskward");
        let rendered = format!("{:?}", settings);

        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("taskward"));
    }
}
