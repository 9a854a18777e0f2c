//! Terminal result of a watch.

use std::fmt;

/// How a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A fresh trigger was found on this attempt.
    Detected { attempt: u32 },
    /// Every attempt ran without finding a fresh trigger.
    Exhausted { attempts: u32 },
    /// Configuration could not be resolved; no attempt was made.
    ConfigError(String),
    /// An authentication failure ended the watch early.
    Aborted { attempt: u32, reason: String },
    /// The user interrupted the watch.
    Interrupted,
}

impl WatchOutcome {
    pub const EXIT_SUCCESS: i32 = 0;
    pub const EXIT_FAILURE: i32 = 1;
    pub const EXIT_INTERRUPTED: i32 = 130;

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            WatchOutcome::Detected { .. } => Self::EXIT_SUCCESS,
            WatchOutcome::Exhausted { .. }
            | WatchOutcome::ConfigError(_)
            | WatchOutcome::Aborted { .. } => Self::EXIT_FAILURE,
            WatchOutcome::Interrupted => Self::EXIT_INTERRUPTED,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, WatchOutcome::Detected { .. })
    }
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchOutcome::Detected { attempt } => write!(f, "detected on attempt {}", attempt),
            WatchOutcome::Exhausted { attempts } => {
                write!(f, "not detected after {} attempts", attempts)
            }
            WatchOutcome::ConfigError(detail) => write!(f, "configuration error: {}", detail),
            WatchOutcome::Aborted { attempt, reason } => {
                write!(f, "aborted on attempt {}: {}", attempt, reason)
            }
            WatchOutcome::Interrupted => f.write_str("interrupted"),
        }
    }
}
