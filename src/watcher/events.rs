//! Progress events emitted by the poller.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ErrorCategory;

/// Severity of an event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Error,
    Success,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "INFO",
            EventLevel::Error => "ERROR",
            EventLevel::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position within the attempt budget, rendered as `attempt/max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub attempt: u32,
    pub max: u32,
}

impl Progress {
    pub fn new(attempt: u32, max: u32) -> Self {
        Self { attempt, max }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.attempt, self.max)
    }
}

/// Something the watch wants reported.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    WatchStarted {
        target: String,
        max_attempts: u32,
        check_interval: Duration,
        watch_start: DateTime<Utc>,
    },
    AttemptStarted {
        progress: Progress,
    },
    NotYetPresent {
        progress: Progress,
    },
    StaleTrigger {
        progress: Progress,
        modified_at: Option<DateTime<Utc>>,
        watch_start: DateTime<Utc>,
    },
    ProbeFailed {
        progress: Progress,
        category: ErrorCategory,
        error: String,
    },
    Waiting {
        progress: Progress,
        interval: Duration,
    },
    Detected {
        progress: Progress,
        modified_at: Option<DateTime<Utc>>,
    },
    Exhausted {
        attempts: u32,
    },
    Aborted {
        progress: Progress,
        reason: String,
    },
    ConfigRejected {
        reason: String,
    },
}

impl WatchEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            WatchEvent::Detected { .. } => EventLevel::Success,
            WatchEvent::ProbeFailed { .. }
            | WatchEvent::Exhausted { .. }
            | WatchEvent::Aborted { .. }
            | WatchEvent::ConfigRejected { .. } => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }

    /// Attempt position, for events tied to one attempt.
    pub fn progress(&self) -> Option<Progress> {
        match self {
            WatchEvent::AttemptStarted { progress }
            | WatchEvent::NotYetPresent { progress }
            | WatchEvent::StaleTrigger { progress, .. }
            | WatchEvent::ProbeFailed { progress, .. }
            | WatchEvent::Waiting { progress, .. }
            | WatchEvent::Detected { progress, .. }
            | WatchEvent::Aborted { progress, .. } => Some(*progress),
            WatchEvent::Exhausted { attempts } => Some(Progress::new(*attempts, *attempts)),
            WatchEvent::WatchStarted { .. } | WatchEvent::ConfigRejected { .. } => None,
        }
    }

    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchEvent::WatchStarted { .. } => "watch_started",
            WatchEvent::AttemptStarted { .. } => "attempt_started",
            WatchEvent::NotYetPresent { .. } => "not_yet_present",
            WatchEvent::StaleTrigger { .. } => "stale_trigger",
            WatchEvent::ProbeFailed { .. } => "probe_failed",
            WatchEvent::Waiting { .. } => "waiting",
            WatchEvent::Detected { .. } => "detected",
            WatchEvent::Exhausted { .. } => "exhausted",
            WatchEvent::Aborted { .. } => "aborted",
            WatchEvent::ConfigRejected { .. } => "config_rejected",
        }
    }
}

fn fmt_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::WatchStarted {
                target,
                max_attempts,
                check_interval,
                watch_start,
            } => write!(
                f,
                "Watching {} (up to {} attempts every {}s, accepting triggers modified since {})",
                target,
                max_attempts,
                check_interval.as_secs(),
                fmt_time(watch_start)
            ),
            WatchEvent::AttemptStarted { .. } => f.write_str("Checking for trigger"),
            WatchEvent::NotYetPresent { .. } => f.write_str("Trigger not present yet"),
            WatchEvent::StaleTrigger {
                modified_at: Some(at),
                watch_start,
                ..
            } => write!(
                f,
                "Trigger is stale (modified {}, before {})",
                fmt_time(at),
                fmt_time(watch_start)
            ),
            WatchEvent::StaleTrigger {
                modified_at: None, ..
            } => f.write_str("Trigger exists but has no modification time; treating as stale"),
            WatchEvent::ProbeFailed {
                category, error, ..
            } => write!(f, "Check failed ({}): {}", category, error),
            WatchEvent::Waiting { interval, .. } => {
                write!(f, "Retrying in {}s", interval.as_secs())
            }
            WatchEvent::Detected {
                modified_at: Some(at),
                ..
            } => write!(f, "Trigger detected (modified {})", fmt_time(at)),
            WatchEvent::Detected {
                modified_at: None, ..
            } => f.write_str("Trigger detected"),
            WatchEvent::Exhausted { attempts } => {
                write!(f, "Trigger not found after {} attempts", attempts)
            }
            WatchEvent::Aborted { reason, .. } => write!(f, "Watch aborted: {}", reason),
            WatchEvent::ConfigRejected { reason } => write!(f, "Configuration error: {}", reason),
        }
    }
}
