//! SSH session negotiation and authentication errors.

use std::fmt;

use thiserror::Error;

use crate::auth::KeyAlgorithm;

use super::ErrorCategory;

/// One failed attempt to read private key material as a given algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParseDiagnostic {
    /// Algorithm the parser tried.
    pub algorithm: KeyAlgorithm,
    /// Why the material was not accepted.
    pub message: String,
}

impl fmt::Display for KeyParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.algorithm, self.message)
    }
}

/// Authentication-specific error variants.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required secret is empty.
    #[error("{what} is not set")]
    MissingSecret { what: String },

    /// The configured auth method is not one we support.
    #[error("unsupported auth method '{0}' (expected 'password' or 'private_key')")]
    UnsupportedMethod(String),

    /// No key parser accepted the private key material.
    #[error("failed to load private key: {}", join_diagnostics(.0))]
    KeyLoadFailed(Vec<KeyParseDiagnostic>),

    /// The server refused the credentials.
    #[error("server rejected credentials: {0}")]
    Rejected(String),

    /// The SSH handshake did not complete.
    #[error("SSH handshake failed: {0}")]
    Handshake(String),

    /// The server's host key does not match the pinned fingerprint.
    #[error("host key mismatch: expected {expected}, server presented {actual}")]
    HostKeyMismatch { expected: String, actual: String },
}

fn join_diagnostics(diagnostics: &[KeyParseDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl AuthError {
    /// Classify the error for retry and reporting decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::UnsupportedMethod(_) => ErrorCategory::Configuration,
            AuthError::Handshake(_) => ErrorCategory::Network,
            AuthError::MissingSecret { .. }
            | AuthError::KeyLoadFailed(_)
            | AuthError::Rejected(_)
            | AuthError::HostKeyMismatch { .. } => ErrorCategory::Auth,
        }
    }
}
