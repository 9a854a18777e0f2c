//! Error types for the trigger watcher.
//!
//! - **Error Categories**: classification driving retry and log-level decisions
//! - **Domain-specific Errors**: configuration, proxy tunnel, authentication,
//!   and backend probe failures
//!
//! # Error Categories
//!
//! | Category | Description | Retried |
//! |----------|-------------|---------|
//! | Configuration | Invalid settings, unsupported backend/auth method | No |
//! | Network | Proxy, connect, handshake, SFTP protocol errors | Yes |
//! | Auth | Rejected credentials, unparseable keys | Yes, unless fail-fast |
//! | NotFound | Trigger absent | Yes (steady state) |
//! | System | Local filesystem errors | Yes |

mod auth;
mod category;
mod config;
mod probe;
mod tunnel;

pub use auth::{AuthError, KeyParseDiagnostic};
pub use category::ErrorCategory;
pub use config::ConfigError;
pub use probe::ProbeError;
pub use tunnel::TunnelError;
