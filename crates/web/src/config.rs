//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string for the admin account
//!   (or `ADMIN_PASSWORD` in development, hashed at startup)
//!
//! ## Database
//! - `DATABASE_URL` - Full connection string; overrides the discrete settings
//! - `DB_HOST` (default: localhost; a leading `/` selects a unix socket dir)
//! - `DB_PORT` (default: 5432)
//! - `DB_NAME` (default: `crocheted_crumb`)
//! - `DB_USER` (default: postgres)
//! - `DB_PASSWORD` (default: empty)
//! - `DB_POOL_MIN` / `DB_POOL_MAX` (default: 1 / 10)
//! - `DB_ACQUIRE_TIMEOUT_SECS` (default: 5)
//!
//! ## Optional
//! - `CRUMB_HOST` - Bind address (default: 127.0.0.1)
//! - `CRUMB_PORT` - Listen port (default: 8080)
//! - `CRUMB_BASE_URL` - Public URL (default: <http://localhost:8080>)
//! - `ADMIN_USERNAME` - Admin login name (default: admin)
//! - `MOCK_MODE` - Render home/contact from fixture content (default: false)
//! - `GOOGLE_CLOUD_PROJECT` - Event log project; unset disables the event log
//! - `EVENT_LOG_ACCESS_TOKEN` - Bearer token for the event log
//! - `EVENT_LOG_COLLECTION_PREFIX` - Collection prefix (default: `sarah_site_`)
//! - `EVENT_LOG_ENDPOINT` - Firestore REST base URL
//! - `PAYMENT_PUBLIC_KEY` / `PAYMENT_SECRET_KEY` - Payment processor keys
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking
//! - `LOG_FORMAT` - `text` (default) or `json`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Signed cookies need a 64-byte key.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_EVENT_LOG_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_COLLECTION_PREFIX: &str = "sarah_site_";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct CrumbConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Admin account credentials
    pub admin: AdminConfig,
    /// Serve fixture content on the home and contact pages
    pub mock_mode: bool,
    /// Secondary event log (disabled when `None`)
    pub event_log: Option<EventLogConfig>,
    /// Payment processor keys
    pub payments: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; wins over the discrete fields when set
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    pub min_connections: u32,
    pub max_connections: u32,
    /// How long `acquire` waits before reporting the pool unavailable
    pub acquire_timeout: Duration,
}

/// How the admin password is supplied.
#[derive(Clone)]
pub enum AdminPassword {
    /// Argon2 PHC string.
    Hashed(SecretString),
    /// Development-only plaintext, hashed at startup.
    Plaintext(SecretString),
}

impl std::fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashed(_) => f.write_str("Hashed([REDACTED])"),
            Self::Plaintext(_) => f.write_str("Plaintext([REDACTED])"),
        }
    }
}

/// Single admin account.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: AdminPassword,
}

/// Firestore-backed event log settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct EventLogConfig {
    pub project_id: String,
    pub collection_prefix: String,
    pub access_token: Option<SecretString>,
    pub endpoint: String,
}

impl std::fmt::Debug for EventLogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogConfig")
            .field("project_id", &self.project_id)
            .field("collection_prefix", &self.collection_prefix)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Payment processor keys.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Publishable key, safe to render in the checkout page
    pub public_key: String,
    pub secret_key: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl CrumbConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&Env::new(|key| std::env::var(key).ok()))
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`CrumbConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(&Env::new(|key| vars.get(key).cloned()))
    }

    fn from_source(env: &Env<'_>) -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_source(env)?;
        let host = env.parse_or("CRUMB_HOST", "127.0.0.1")?;
        let port = env.parse_or("CRUMB_PORT", "8080")?;
        let base_url = env.or_default("CRUMB_BASE_URL", "http://localhost:8080");

        let session_secret = env.validated_secret("SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SESSION_SECRET")?;

        let admin = AdminConfig::from_source(env)?;
        let mock_mode = parse_bool(&env.or_default("MOCK_MODE", "false"));
        let event_log = EventLogConfig::from_source(env);
        let payments = PaymentConfig::from_source(env);

        let log_format = env
            .optional("LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("LOG_FORMAT".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            database,
            host,
            port,
            base_url,
            session_secret,
            admin,
            mock_mode,
            event_log,
            payments,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl DatabaseConfig {
    /// Load only the database settings.
    ///
    /// Used by tooling that does not need the session or admin secrets.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a database variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_source(&Env::new(|key| std::env::var(key).ok()))
    }

    fn from_source(env: &Env<'_>) -> Result<Self, ConfigError> {
        let min_connections: u32 = env.parse_or("DB_POOL_MIN", "1")?;
        let max_connections: u32 = env.parse_or("DB_POOL_MAX", "10")?;
        if max_connections == 0 || min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "DB_POOL_MAX".to_string(),
                format!("pool bounds {min_connections}..={max_connections} are invalid"),
            ));
        }

        Ok(Self {
            url: env.optional("DATABASE_URL").map(SecretString::from),
            host: env.or_default("DB_HOST", "localhost"),
            port: env.parse_or("DB_PORT", "5432")?,
            name: env.or_default("DB_NAME", "crocheted_crumb"),
            user: env.or_default("DB_USER", "postgres"),
            password: SecretString::from(env.or_default("DB_PASSWORD", "")),
            min_connections,
            max_connections,
            acquire_timeout: Duration::from_secs(env.parse_or("DB_ACQUIRE_TIMEOUT_SECS", "5")?),
        })
    }
}

impl AdminConfig {
    fn from_source(env: &Env<'_>) -> Result<Self, ConfigError> {
        let username = env.or_default("ADMIN_USERNAME", "admin");
        let password = if let Some(hash) = env.optional("ADMIN_PASSWORD_HASH") {
            AdminPassword::Hashed(SecretString::from(hash))
        } else if let Some(plain) = env.optional("ADMIN_PASSWORD") {
            if plain.is_empty() {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_PASSWORD".to_string(),
                    "cannot be empty".to_string(),
                ));
            }
            AdminPassword::Plaintext(SecretString::from(plain))
        } else {
            return Err(ConfigError::MissingEnvVar(
                "ADMIN_PASSWORD_HASH".to_string(),
            ));
        };

        Ok(Self { username, password })
    }
}

impl EventLogConfig {
    fn from_source(env: &Env<'_>) -> Option<Self> {
        let project_id = env.optional("GOOGLE_CLOUD_PROJECT")?;
        Some(Self {
            project_id,
            collection_prefix: env
                .or_default("EVENT_LOG_COLLECTION_PREFIX", DEFAULT_COLLECTION_PREFIX),
            access_token: env.optional("EVENT_LOG_ACCESS_TOKEN").map(SecretString::from),
            endpoint: env.or_default("EVENT_LOG_ENDPOINT", DEFAULT_EVENT_LOG_ENDPOINT),
        })
    }
}

impl PaymentConfig {
    fn from_source(env: &Env<'_>) -> Self {
        Self {
            public_key: env.or_default("PAYMENT_PUBLIC_KEY", "pk_test_stub_key"),
            secret_key: SecretString::from(env.or_default("PAYMENT_SECRET_KEY", "sk_test_stub_key")),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup used while loading configuration.
struct Env<'a> {
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
}

impl<'a> Env<'a> {
    fn new(lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default) into `T`.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GOOD_SECRET: &str =
        "q8Vt3LzR1mXa7NcKpW0yHs5JdFgB2eUi9oTnZrQx4vCl6MbAjYk8PwSfGhE3uDt1";

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            ("SESSION_SECRET".to_string(), GOOD_SECRET.to_string()),
            (
                "ADMIN_PASSWORD_HASH".to_string(),
                "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
            ),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = CrumbConfig::from_map(&base_vars()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.name, "crocheted_crumb");
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.admin.username, "admin");
        assert!(matches!(config.admin.password, AdminPassword::Hashed(_)));
        assert!(!config.mock_mode);
        assert!(config.event_log.is_none());
        assert_eq!(config.payments.public_key, "pk_test_stub_key");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_admin_password() {
        let mut vars = base_vars();
        vars.remove("ADMIN_PASSWORD_HASH");
        let err = CrumbConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "ADMIN_PASSWORD_HASH"));
    }

    #[test]
    fn test_plaintext_admin_password_fallback() {
        let mut vars = base_vars();
        vars.remove("ADMIN_PASSWORD_HASH");
        vars.insert("ADMIN_PASSWORD".to_string(), "hunter2-but-longer".to_string());
        let config = CrumbConfig::from_map(&vars).unwrap();
        assert!(matches!(config.admin.password, AdminPassword::Plaintext(_)));
    }

    #[test]
    fn test_invalid_pool_bounds() {
        let mut vars = base_vars();
        vars.insert("DB_POOL_MIN".to_string(), "5".to_string());
        vars.insert("DB_POOL_MAX".to_string(), "2".to_string());
        assert!(matches!(
            CrumbConfig::from_map(&vars),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = base_vars();
        vars.insert("CRUMB_PORT".to_string(), "eighty".to_string());
        assert!(matches!(
            CrumbConfig::from_map(&vars),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CRUMB_PORT"
        ));
    }

    #[test]
    fn test_event_log_enabled_by_project() {
        let mut vars = base_vars();
        vars.insert("GOOGLE_CLOUD_PROJECT".to_string(), "crumb-prod".to_string());
        vars.insert("MOCK_MODE".to_string(), "true".to_string());
        let config = CrumbConfig::from_map(&vars).unwrap();
        let event_log = config.event_log.unwrap();
        assert_eq!(event_log.project_id, "crumb-prod");
        assert_eq!(event_log.collection_prefix, "sarah_site_");
        assert!(event_log.access_token.is_none());
        assert!(config.mock_mode);
    }

    #[test]
    fn test_log_format() {
        let mut vars = base_vars();
        vars.insert("LOG_FORMAT".to_string(), "JSON".to_string());
        assert_eq!(
            CrumbConfig::from_map(&vars).unwrap().log_format,
            LogFormat::Json
        );
        vars.insert("LOG_FORMAT".to_string(), "xml".to_string());
        assert!(CrumbConfig::from_map(&vars).is_err());
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-session-key-goes-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        assert!(validate_secret_strength(&"ab".repeat(40), "TEST_VAR").is_err());
    }

    #[test]
    fn test_session_secret_too_short() {
        let mut vars = base_vars();
        vars.insert("SESSION_SECRET".to_string(), "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6".to_string());
        assert!(matches!(
            CrumbConfig::from_map(&vars),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let payments = PaymentConfig {
            public_key: "pk_live_visible".to_string(),
            secret_key: SecretString::from("sk_live_hidden_value"),
        };
        let output = format!("{payments:?}");
        assert!(output.contains("pk_live_visible"));
        assert!(!output.contains("sk_live_hidden_value"));

        let admin = AdminPassword::Plaintext(SecretString::from("s3cret-admin"));
        assert!(!format!("{admin:?}").contains("s3cret-admin"));
    }
}
