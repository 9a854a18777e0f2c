//! Error category classification for retry decisions.
//!
//! Every failure the watcher can observe maps to one of these categories.
//! The poller uses the category to decide whether an attempt-level failure
//! feeds the retry loop or ends the watch, and at which level to report it.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid or incomplete configuration.
    /// Fatal: the watch never starts.
    Configuration,

    /// Connection, proxy tunnel, handshake, timeout or protocol errors.
    /// Transient and retried.
    Network,

    /// Credential problems (rejected password/key, unparseable key,
    /// host key mismatch). Retried unless fail-fast is enabled.
    Auth,

    /// The trigger is not there yet. Expected steady state.
    NotFound,

    /// Local filesystem or OS errors.
    System,
}

impl ErrorCategory {
    /// Returns true if an attempt that failed with this category may be
    /// followed by another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorCategory::Configuration)
    }

    /// Returns true if failures in this category should be reported at
    /// error level. Absence of the trigger is never an error.
    pub fn is_error(&self) -> bool {
        !matches!(self, ErrorCategory::NotFound)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::System => "system",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(!ErrorCategory::Configuration.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Auth.is_retryable());
        assert!(ErrorCategory::NotFound.is_retryable());
        assert!(ErrorCategory::System.is_retryable());
    }

    #[test]
    fn test_not_found_is_not_an_error() {
        assert!(!ErrorCategory::NotFound.is_error());
        assert!(ErrorCategory::Network.is_error());
        assert!(ErrorCategory::Auth.is_error());
    }

    #[test]
    fn test_display_matches_label() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
    }
}
