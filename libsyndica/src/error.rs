//! Error types for Syndica

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyndicaError>;

#[derive(Error, Debug)]
pub enum SyndicaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyndicaError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SyndicaError::InvalidInput(_) => 3,
            SyndicaError::Platform(PlatformError::Fatal(_)) => 2,
            SyndicaError::Platform(_) => 1,
            SyndicaError::Config(_) => 1,
            SyndicaError::Database(_) => 1,
        }
    }

    /// Whether a retry handler may attempt this error again.
    ///
    /// Only transient remote failures and rate-limit rejections qualify;
    /// validation, auth and unsupported-operation errors never do.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyndicaError::Platform(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Stored record is malformed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by platform adapters and their collaborators.
///
/// `Clone` is required so retry loops and scripted mocks can re-issue
/// the same error value.
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    /// Content violates the platform's declared requirements. Never retried.
    #[error("Content validation failed: {0}")]
    Validation(String),

    /// Admission denied by the rate limiter. `retry_after` tells the caller
    /// when the oldest window entry expires.
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Timeout, connection failure, 429 or 5xx from the remote service.
    /// Absorbed by the retry handler up to its attempt ceiling.
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// 401/403 invalid credential or 400 content rejected remotely.
    /// Surfaced immediately without retry.
    #[error("Remote service rejected the request: {0}")]
    Fatal(String),

    /// Operation the platform's requirements declare unavailable,
    /// e.g. native scheduling on Twitter.
    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Default message patterns that mark an otherwise-unclassified error
/// as transient.
pub const RETRYABLE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection",
    "429",
    "500",
    "502",
    "503",
    "504",
    "rate limit",
    "unavailable",
];

impl PlatformError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Transient(_) | PlatformError::RateLimited { .. } => true,
            PlatformError::Validation(_)
            | PlatformError::Fatal(_)
            | PlatformError::NotSupported(_) => false,
        }
    }

    /// Classify a raw remote error message into `Transient` or `Fatal`
    /// using the default retryable patterns.
    pub fn from_remote_message(message: String) -> Self {
        let lower = message.to_lowercase();
        if RETRYABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
            PlatformError::Transient(message)
        } else {
            PlatformError::Fatal(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = SyndicaError::InvalidInput("empty content".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_fatal_remote() {
        let error = SyndicaError::Platform(PlatformError::Fatal("401 Unauthorized".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_platform_errors() {
        let transient = SyndicaError::Platform(PlatformError::Transient("timeout".to_string()));
        assert_eq!(transient.exit_code(), 1);

        let validation =
            SyndicaError::Platform(PlatformError::Validation("too long".to_string()));
        assert_eq!(validation.exit_code(), 1);

        let rate = SyndicaError::Platform(PlatformError::RateLimited {
            message: "instagram:acct".to_string(),
            retry_after: Some(Duration::from_secs(30)),
        });
        assert_eq!(rate.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_config_and_db() {
        let config = SyndicaError::Config(ConfigError::MissingField("database.path".to_string()));
        assert_eq!(config.exit_code(), 1);

        let db = SyndicaError::Database(DbError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        )));
        assert_eq!(db.exit_code(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PlatformError::Transient("503".to_string()).is_retryable());
        assert!(PlatformError::RateLimited {
            message: "burst".to_string(),
            retry_after: None,
        }
        .is_retryable());
        assert!(!PlatformError::Validation("bad".to_string()).is_retryable());
        assert!(!PlatformError::Fatal("401".to_string()).is_retryable());
        assert!(!PlatformError::NotSupported("scheduling".to_string()).is_retryable());
    }

    #[test]
    fn test_from_remote_message_transient_patterns() {
        for msg in [
            "connection timeout",
            "HTTP 429 Too Many Requests",
            "503 Service Unavailable",
            "network unreachable",
            "rate limit hit",
        ] {
            assert!(
                matches!(
                    PlatformError::from_remote_message(msg.to_string()),
                    PlatformError::Transient(_)
                ),
                "expected transient for {msg:?}"
            );
        }
    }

    #[test]
    fn test_from_remote_message_fatal() {
        assert!(matches!(
            PlatformError::from_remote_message("401 invalid credential".to_string()),
            PlatformError::Fatal(_)
        ));
        assert!(matches!(
            PlatformError::from_remote_message("400 caption rejected".to_string()),
            PlatformError::Fatal(_)
        ));
    }

    #[test]
    fn test_error_message_formatting() {
        let error = SyndicaError::Platform(PlatformError::Validation(
            "text exceeds 280 characters".to_string(),
        ));
        assert_eq!(
            format!("{}", error),
            "Platform error: Content validation failed: text exceeds 280 characters"
        );

        let rate = PlatformError::RateLimited {
            message: "twitter:acct-1".to_string(),
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(format!("{}", rate), "Rate limit exceeded: twitter:acct-1");
    }

    #[test]
    fn test_error_conversions() {
        let platform_error = PlatformError::Transient("test".to_string());
        let error: SyndicaError = platform_error.into();
        assert!(matches!(error, SyndicaError::Platform(_)));

        let config_error = ConfigError::MissingField("test".to_string());
        let error: SyndicaError = config_error.into();
        assert!(matches!(error, SyndicaError::Config(_)));
    }

    #[test]
    fn test_platform_error_clone() {
        let original = PlatformError::Transient("connection reset".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }
}
