//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin service
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 64 chars, high entropy)
//! - `ADMIN_USERS_FILE` - YAML file listing the admin directory
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `THALA_API_URL` - Backend REST API base (default: <https://backend.thala.app/api/v1>)
//! - `BACKEND_URL` - Backend host for admin endpoints (default: <http://localhost:8000>)
//! - `ADMIN_IDENTITY_HEADER` - Header carrying the proxy-authenticated email
//!   (default: `x-auth-request-email`)
//! - `ADMIN_IDENTITY_NAME_HEADER` - Header carrying the display name
//!   (default: `x-auth-request-user`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use thala_core::{AdminDirectory, AdminEntry, DirectoryError};

/// Signed cookies need a 64-byte master key.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_API_URL: &str = "https://backend.thala.app/api/v1";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_IDENTITY_HEADER: &str = "x-auth-request-email";
pub const DEFAULT_IDENTITY_NAME_HEADER: &str = "x-auth-request-user";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
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
    #[error("Admin directory {0}: {1}")]
    AdminDirectory(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin service
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// YAML file with the admin directory
    pub users_file: PathBuf,
    /// Backend REST API base, without trailing slash
    pub api_url: String,
    /// Backend host serving `/api/v1/admin/*`, without trailing slash
    pub backend_url: String,
    /// Proxy header carrying the authenticated email
    pub identity_header: String,
    /// Proxy header carrying the display name
    pub identity_name_header: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
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

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_url("ADMIN_BASE_URL", None)?;
        let session_secret = get_validated_secret("ADMIN_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;
        let users_file = PathBuf::from(get_required_env("ADMIN_USERS_FILE")?);

        let api_url = get_url("THALA_API_URL", Some(DEFAULT_API_URL))?;
        let backend_url = get_url("BACKEND_URL", Some(DEFAULT_BACKEND_URL))?;
        let identity_header = get_env_or_default("ADMIN_IDENTITY_HEADER", DEFAULT_IDENTITY_HEADER)
            .to_ascii_lowercase();
        let identity_name_header =
            get_env_or_default("ADMIN_IDENTITY_NAME_HEADER", DEFAULT_IDENTITY_NAME_HEADER)
                .to_ascii_lowercase();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            users_file,
            api_url,
            backend_url,
            identity_header,
            identity_name_header,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Load the admin directory from [`Self::users_file`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AdminDirectory` if the file cannot be read or parsed.
    pub fn load_admin_directory(&self) -> Result<AdminDirectory, ConfigError> {
        load_admin_directory(&self.users_file)
    }
}

// =============================================================================
// Admin directory file
// =============================================================================

/// Top-level layout of the admin directory YAML file.
///
/// ```yaml
/// admins:
///   - email: ops@thala.app
///     name: Ops
///     role: super_admin
/// ```
#[derive(Debug, Deserialize)]
struct AdminUsersFile {
    admins: Vec<AdminEntry>,
}

/// Read and parse an admin directory YAML file.
///
/// # Errors
///
/// Returns `ConfigError::AdminDirectory` if the file cannot be read, is not
/// valid YAML, or lists an email twice.
pub fn load_admin_directory(path: &Path) -> Result<AdminDirectory, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::AdminDirectory(display.clone(), e.to_string()))?;
    parse_admin_directory(&contents).map_err(|e| match e {
        ConfigError::AdminDirectory(_, reason) => ConfigError::AdminDirectory(display, reason),
        other => other,
    })
}

/// Parse an admin directory from YAML text.
///
/// # Errors
///
/// Returns `ConfigError::AdminDirectory` on malformed YAML, invalid emails or
/// roles, or duplicate entries.
pub fn parse_admin_directory(yaml: &str) -> Result<AdminDirectory, ConfigError> {
    let file: AdminUsersFile = serde_yaml::from_str(yaml)
        .map_err(|e| ConfigError::AdminDirectory("<inline>".to_string(), e.to_string()))?;
    AdminDirectory::new(file.admins).map_err(|e: DirectoryError| {
        ConfigError::AdminDirectory("<inline>".to_string(), e.to_string())
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a URL variable, validated and stripped of trailing slashes.
fn get_url(key: &str, default: Option<&str>) -> Result<String, ConfigError> {
    let raw = match default {
        Some(default) => get_env_or_default(key, default),
        None => get_required_env(key)?,
    };
    normalize_url(&raw).map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

/// Validate an absolute http(s) URL and drop trailing slashes.
fn normalize_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(raw.trim_end_matches('/').to_string())
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
    let len = s.len() as f64;
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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use thala_core::{AdminPermission, AdminRole};

    use super::*;

    const STRONG: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6(dF8)gH1-jK3+lM5=nP7[qR9]sT2{vW4}";

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-session-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength(&"a".repeat(80), "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength(STRONG, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_session_secret_needs_64_chars() {
        let short = SecretString::from("x".repeat(63));
        assert!(validate_session_secret(&short, "ADMIN_SESSION_SECRET").is_err());
        let exact = SecretString::from("x".repeat(64));
        assert!(validate_session_secret(&exact, "ADMIN_SESSION_SECRET").is_ok());
        assert!(STRONG.len() >= MIN_SESSION_SECRET_LENGTH);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://backend.thala.app/api/v1/").unwrap(),
            "https://backend.thala.app/api/v1"
        );
        assert!(normalize_url("backend.thala.app").is_err());
        assert!(normalize_url("ftp://backend.thala.app").is_err());
    }

    #[test]
    fn test_parse_admin_directory() {
        let directory = parse_admin_directory(
            r"
admins:
  - email: ops@thala.app
    name: Ops
    role: super_admin
  - email: mod@thala.app
    name: Mod
    role: moderator
",
        )
        .unwrap();
        assert_eq!(directory.len(), 2);
        assert!(directory.has_role("ops@thala.app", AdminRole::Admin));
        assert!(directory.has_permission("mod@thala.app", AdminPermission::DeleteVideos));
        assert!(!directory.has_permission("mod@thala.app", AdminPermission::DeleteUsers));
    }

    #[test]
    fn test_parse_admin_directory_rejects_bad_entries() {
        let bad_role = "admins:\n  - email: a@thala.app\n    name: A\n    role: owner\n";
        assert!(matches!(
            parse_admin_directory(bad_role),
            Err(ConfigError::AdminDirectory(_, _))
        ));

        let duplicate = "admins:\n  - {email: a@thala.app, name: A, role: viewer}\n  - {email: a@thala.app, name: B, role: admin}\n";
        let err = parse_admin_directory(duplicate).unwrap_err();
        assert!(err.to_string().contains("a@thala.app"));
    }

    #[test]
    fn test_load_admin_directory_missing_file() {
        let err = load_admin_directory(Path::new("/nonexistent/thala-admins.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/thala-admins.yaml"));
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let config = AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from(STRONG),
            users_file: PathBuf::from("admins.yaml"),
            api_url: DEFAULT_API_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            identity_name_header: DEFAULT_IDENTITY_NAME_HEADER.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
        assert!(!config.is_secure());

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains(STRONG));
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let config = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_private_key_material"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_key_material"));
    }
}
