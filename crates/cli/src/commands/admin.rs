//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! # Prompt-free: read the password from stdin
//! echo 'a long passphrase' | crumb-cli admin hash-password
//!
//! # Or pass it directly (ends up in shell history)
//! crumb-cli admin hash-password --password 'a long passphrase'
//! ```
//!
//! The printed PHC string goes in `ADMIN_PASSWORD_HASH`.

use std::io::BufRead;

use crumb_web::services::auth::{self, AuthError};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Could not read the password from stdin.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// No password given.
    #[error("No password provided")]
    MissingPassword,

    /// Hashing failed or the password is too short.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Hash a password and print the PHC string.
///
/// # Errors
///
/// Returns `AdminError` if no password is available or it is too weak.
pub fn hash_password(password: Option<String>) -> Result<(), AdminError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => read_password(std::io::stdin().lock())?,
    };

    let hash = auth::hash_password(password.expose_secret())?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    tracing::info!("Set ADMIN_PASSWORD_HASH to the value above");
    Ok(())
}

/// Read the first line of `input`, without its line ending.
fn read_password(mut input: impl BufRead) -> Result<SecretString, AdminError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AdminError::MissingPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline() {
        let password = read_password("hunter2hunter2\n".as_bytes());
        assert!(matches!(
            password.as_ref().map(|p| p.expose_secret().to_owned()),
            Ok(ref p) if p == "hunter2hunter2"
        ));
    }

    #[test]
    fn test_read_password_rejects_empty_input() {
        assert!(matches!(
            read_password("\n".as_bytes()),
            Err(AdminError::MissingPassword)
        ));
    }
}
