//! Admin authentication.
//!
//! The back office has a single account. Its password is held as an Argon2
//! PHC string; a plaintext development password is hashed once at startup.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::{AdminConfig, AdminPassword};

/// Minimum length accepted when hashing a new password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak to hash.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The configured hash is not a valid PHC string.
    #[error("malformed password hash")]
    MalformedHash,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Credentials for the back office account.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: SecretString,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AdminCredentials {
    /// Build credentials from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedHash` if a configured hash does not parse,
    /// or `AuthError::PasswordHash` if a plaintext password cannot be hashed.
    pub fn from_config(config: &AdminConfig) -> Result<Self, AuthError> {
        let password_hash = match &config.password {
            AdminPassword::Hashed(hash) => {
                PasswordHash::new(hash.expose_secret()).map_err(|_| AuthError::MalformedHash)?;
                hash.clone()
            }
            AdminPassword::Plaintext(password) => {
                tracing::warn!(
                    "ADMIN_PASSWORD is set in plaintext; use ADMIN_PASSWORD_HASH outside development"
                );
                SecretString::from(hash_password_unchecked(password.expose_secret())?)
            }
        };

        Ok(Self {
            username: config.username.clone(),
            password_hash,
        })
    }

    /// Configured admin username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a login attempt.
    ///
    /// The password is always verified so a wrong username costs the same as
    /// a wrong password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if either value is wrong.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let password_ok = verify_password(password, self.password_hash.expose_secret()).is_ok();
        if password_ok && username == self.username {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hash a new password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`].
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    hash_password_unchecked(password)
}

fn hash_password_unchecked(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC string.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(password: AdminPassword) -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            password,
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("crochet-hooks").unwrap();
        let b = hash_password("crochet-hooks").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(hash_password("short"), Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_verify_hashed_config() {
        let hash = hash_password("crochet-hooks").unwrap();
        let creds =
            AdminCredentials::from_config(&config(AdminPassword::Hashed(hash.into()))).unwrap();

        assert!(creds.verify("admin", "crochet-hooks").is_ok());
        assert!(creds.verify("admin", "wrong-password").is_err());
        assert!(creds.verify("someone", "crochet-hooks").is_err());
    }

    #[test]
    fn test_plaintext_config_is_hashed() {
        let creds = AdminCredentials::from_config(&config(AdminPassword::Plaintext(
            "dev".to_string().into(),
        )))
        .unwrap();

        assert!(creds.password_hash.expose_secret().starts_with("$argon2"));
        assert!(creds.verify("admin", "dev").is_ok());
    }

    #[test]
    fn test_malformed_hash_rejected() {
        let result =
            AdminCredentials::from_config(&config(AdminPassword::Hashed("not-a-hash".into())));
        assert!(matches!(result, Err(AuthError::MalformedHash)));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let creds = AdminCredentials::from_config(&config(AdminPassword::Plaintext(
            "dev".to_string().into(),
        )))
        .unwrap();
        assert!(!format!("{creds:?}").contains("argon2"));
    }
}
