//! Access and refresh tokens.
//!
//! An access token is an HS256 JWT bound to one row of `user_sessions`
//! through its `sid` claim, so revoking that row (logout, refresh rotation)
//! also stops the token from passing the save gate. Refresh tokens are
//! opaque; the database keeps only their SHA-256 digest.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sitesmith_core::types::DbId;
use uuid::Uuid;

/// Payload of a Sitesmith access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id.
    pub sub: DbId,
    /// Sign-in session (`user_sessions.id`) the token was issued under.
    pub sid: DbId,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Read `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (default 15)
    /// and `JWT_REFRESH_EXPIRY_DAYS` (default 7).
    ///
    /// # Panics
    ///
    /// Panics on a missing or empty secret, or a lifetime that is not a
    /// positive integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins =
            positive_env("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS);
        let refresh_token_expiry_days =
            positive_env("JWT_REFRESH_EXPIRY_DAYS", DEFAULT_REFRESH_EXPIRY_DAYS);

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_token_ttl_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }
}

fn positive_env(name: &str, default: i64) -> i64 {
    let value: i64 = std::env::var(name)
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{name} must be a valid i64")))
        .unwrap_or(default);
    assert!(value > 0, "{name} must be positive");
    value
}

/// Sign an access token for `user_id` under sign-in session `session_id`.
pub fn generate_access_token(
    user_id: DbId,
    session_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        sid: session_id,
        exp: now + config.access_token_ttl_secs(),
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// A fresh refresh token as `(plaintext, digest)`.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// Hex SHA-256 digest stored in `user_sessions.refresh_token_hash`.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "sitesmith-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn access_token_carries_user_and_session() {
        let config = test_config();
        let token = generate_access_token(42, 7, &config).expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.sid, 7);
        assert_eq!(claims.exp - claims.iat, config.access_token_ttl_secs());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();

        // Past the 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            sid: 1,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn token_without_session_claim_is_rejected() {
        #[derive(Serialize)]
        struct Legacy {
            sub: DbId,
            exp: i64,
            iat: i64,
        }
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &Legacy { sub: 1, exp: now + 60, iat: now },
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hash_stably() {
        let (a, hash_a) = generate_refresh_token();
        let (b, _) = generate_refresh_token();

        assert_ne!(a, b);
        assert_eq!(hash_refresh_token(&a), hash_a);
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = generate_access_token(1, 1, &test_config()).unwrap();
        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        };

        assert!(validate_token(&token, &other).is_err());
    }
}
