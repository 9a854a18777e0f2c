//! Backend probe trait abstraction.
//!
//! A probe answers one question: does the trigger exist, and if so when was
//! it last modified? The poller only ever talks to this trait, so the local
//! and remote backends (and test doubles) are interchangeable.

use chrono::{DateTime, Utc};

use crate::error::ProbeError;

/// Result of a successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// Whether the trigger path exists.
    pub exists: bool,
    /// Last modification time, when the backend reports one.
    pub modified_at: Option<DateTime<Utc>>,
}

impl ProbeResult {
    /// The trigger is absent.
    pub fn missing() -> Self {
        Self {
            exists: false,
            modified_at: None,
        }
    }

    /// The trigger exists and was last modified at `modified_at`.
    pub fn present(modified_at: DateTime<Utc>) -> Self {
        Self {
            exists: true,
            modified_at: Some(modified_at),
        }
    }

    /// The trigger exists but the backend reported no modification time.
    pub fn present_without_mtime() -> Self {
        Self {
            exists: true,
            modified_at: None,
        }
    }
}

/// Trait for checking a backend for the trigger file.
///
/// Implementations perform blocking I/O; the poller runs them on tokio's
/// blocking pool. Each call is a complete, self-contained attempt: any
/// connection or session it opens is released before it returns.
pub trait TriggerProbe: Send + Sync {
    /// Check for the trigger once.
    ///
    /// # Returns
    /// - `Ok(ProbeResult)` with `exists == false`, or `Err(ProbeError::NotFound)`,
    ///   when the trigger is absent
    /// - `Ok(ProbeResult)` with `exists == true` and the mtime when present
    /// - `Err(ProbeError)` for transport failures
    fn probe(&self) -> Result<ProbeResult, ProbeError>;

    /// Human-readable location of the trigger, for progress output.
    fn describe(&self) -> String;
}
