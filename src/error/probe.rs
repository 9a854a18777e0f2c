//! Backend probe errors.
//!
//! `NotFound` is the expected steady state while the upstream producer is
//! still running; every other variant is a transport-class failure that
//! carries enough detail to log its root cause.

use std::path::PathBuf;

use thiserror::Error;

use super::{AuthError, ErrorCategory, TunnelError};

/// A single probe attempt failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The trigger path does not exist on the backend.
    #[error("trigger not found at {path}")]
    NotFound { path: String },

    /// The proxy tunnel could not be opened.
    #[error(transparent)]
    Tunnel(#[from] TunnelError),

    /// Session negotiation or authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Direct TCP connection to the server failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// An SSH or SFTP operation failed.
    #[error("SFTP {operation} failed: {source}")]
    Ssh {
        operation: &'static str,
        #[source]
        source: ssh2::Error,
    },

    /// Local filesystem access failed for a reason other than absence.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other transport fault.
    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    /// Classify the error for retry and reporting decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::NotFound { .. } => ErrorCategory::NotFound,
            ProbeError::Auth(err) => err.category(),
            ProbeError::Io { .. } => ErrorCategory::System,
            ProbeError::Tunnel(_)
            | ProbeError::Connect { .. }
            | ProbeError::Ssh { .. }
            | ProbeError::Transport(_) => ErrorCategory::Network,
        }
    }

    /// True for the "trigger is absent" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeError::NotFound { .. })
    }
}
