//! JWT session module.
//!
//! Handles session token generation and validation, plus argon2 password
//! hashing for user accounts. Token lifetime is not fixed here: login reads
//! `security.session_minutes` from settings and passes it in.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use backoffice_core::types::{Role, User};
use backoffice_core::validation::validate_password;
use backoffice_db::repository::user::generate_user_id;
use backoffice_db::{Database, UserRecord};

use crate::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Display name shown in the admin panel header
    pub name: String,

    /// Role the permission check runs against
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Session token manager.
pub struct SessionManager {
    secret: String,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(secret: String) -> Self {
        SessionManager { secret }
    }

    /// Generate a session token for a logged-in user.
    pub fn issue_token(&self, user: &User, lifetime_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            name: user.display_name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a session token.
    ///
    /// Expired or tampered tokens come back as `ApiError::AuthFailed`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::AuthFailed(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    if auth_header.starts_with("Bearer ") {
        Some(&auth_header[7..])
    } else {
        None
    }
}

/// Hash a password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored argon2 hash.
///
/// An unparseable stored hash counts as a failed verification rather than an
/// error, so a corrupted row cannot be used to log in.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Creates the first admin account when the users table is empty.
///
/// Runs once at startup. With no accounts and no
/// `BACKOFFICE_ADMIN_PASSWORD` set, the server still starts (health
/// checks must work) but nobody can log in, so this warns loudly.
pub async fn bootstrap_admin(
    db: &Database,
    admin_password: Option<&str>,
) -> Result<(), ApiError> {
    if db.users().count().await? > 0 {
        return Ok(());
    }

    let Some(password) = admin_password else {
        warn!("No accounts exist and BACKOFFICE_ADMIN_PASSWORD is unset; login is impossible");
        return Ok(());
    };
    validate_password(password)?;

    let now = Utc::now();
    let record = UserRecord {
        id: generate_user_id(),
        username: "admin".to_string(),
        display_name: "Administrator".to_string(),
        password_hash: hash_password(password)?,
        role: Role::Admin,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    db.users().insert(&record).await?;
    info!(username = %record.username, "Bootstrapped first admin account");

    Ok(())
}
