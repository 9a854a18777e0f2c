//! Configuration resolution errors.
//!
//! Any of these ends the run before the first attempt.

use std::path::PathBuf;

use thiserror::Error;

use super::AuthError;

/// Configuration could not be resolved into a usable `WatchConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backend name is neither local nor remote.
    #[error("unsupported backend '{0}' (expected 'local' or 'remote')")]
    UnsupportedBackend(String),

    /// Credential configuration problem detected before any network activity.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A required setting is absent or empty.
    #[error("missing required setting {key}")]
    MissingValue { key: &'static str },

    /// A required secret is absent from the environment.
    #[error("secret {variable} is not set in the environment")]
    MissingSecret { variable: String },

    /// A setting is present but cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Proxy is enabled but has no host.
    #[error("HTTP proxy is enabled but no proxy host is configured")]
    ProxyHostMissing,

    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for our schema.
    #[error("failed to parse config file {}: {source}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_names_the_key() {
        let err = ConfigError::MissingValue { key: "SFTP_HOST" };
        assert_eq!(err.to_string(), "missing required setting SFTP_HOST");
    }

    #[test]
    fn test_auth_error_is_transparent() {
        let err: ConfigError = AuthError::UnsupportedMethod("otp".to_string()).into();
        assert!(err.to_string().starts_with("unsupported auth method 'otp'"));
    }
}
