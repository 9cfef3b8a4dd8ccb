//! Password hashing and token issuing.
//!
//! Passwords are hashed with Argon2id. Sessions use a signed token pair:
//! a short-lived access token and a longer-lived refresh token, each signed
//! with its own secret. The refresh token is additionally persisted on the
//! user record so a single overwrite revokes every outstanding refresh token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID.
    pub sub: String,
    /// Username at issue time.
    pub username: String,
    /// Email at issue time.
    pub email: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issued at (seconds since epoch).
    pub iat: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issued at (seconds since epoch).
    pub iat: i64,
}

/// Issue an access token.
pub fn issue_access_token(
    user_id: &str,
    username: &str,
    email: &str,
    secret: &str,
    ttl_minutes: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))
}

/// Issue a refresh token.
pub fn issue_refresh_token(user_id: &str, secret: &str, ttl_days: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {e}")))
}

/// Verify an access token, returning its claims.
pub fn verify_access_token(token: &str, secret: &str) -> AppResult<AccessClaims> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Verify a refresh token, returning its claims.
pub fn verify_refresh_token(token: &str, secret: &str) -> AppResult<RefreshClaims> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2hunter2").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_access_token_round_trip() {
        let token =
            issue_access_token("user1", "alice", "alice@example.com", "secret", 15).unwrap();
        let claims = verify_access_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn test_access_token_rejects_wrong_secret() {
        let token =
            issue_access_token("user1", "alice", "alice@example.com", "secret", 15).unwrap();

        assert!(matches!(
            verify_access_token(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let token = issue_refresh_token("user1", "refresh-secret", 10).unwrap();
        let claims = verify_refresh_token(&token, "refresh-secret").unwrap();

        assert_eq!(claims.sub, "user1");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let token = issue_refresh_token("user1", "secret", 10).unwrap();

        // Different claim set: decoding as access claims must fail.
        assert!(verify_access_token(&token, "secret").is_err());
    }
}
