//! The polling loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::events::{Progress, WatchEvent};
use super::outcome::WatchOutcome;
use crate::config::WatchConfig;
use crate::error::{ErrorCategory, ProbeError};
use crate::traits::{Clock, ProbeResult, TriggerProbe};

/// Timing and retry policy for one watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub check_interval: Duration,
    pub max_attempts: u32,
    pub lookback: Duration,
    pub fail_fast_on_auth: bool,
}

impl From<&WatchConfig> for PollPolicy {
    fn from(config: &WatchConfig) -> Self {
        Self {
            check_interval: config.check_interval,
            max_attempts: config.max_attempts,
            lookback: config.lookback,
            fail_fast_on_auth: config.fail_fast_on_auth,
        }
    }
}

/// Result of classifying one attempt.
enum Attempt {
    Fresh(Option<DateTime<Utc>>),
    Retry,
    Abort(String),
}

/// Repeatedly probes a backend until a fresh trigger shows up or the
/// attempt budget runs out.
pub struct TriggerPoller<C: Clock> {
    probe: Arc<dyn TriggerProbe>,
    clock: C,
    policy: PollPolicy,
}

impl<C: Clock> TriggerPoller<C> {
    pub fn new(probe: Arc<dyn TriggerProbe>, clock: C, policy: PollPolicy) -> Self {
        Self {
            probe,
            clock,
            policy,
        }
    }

    /// Run the watch to completion, reporting each step to `on_event`.
    ///
    /// The lookback window is anchored once, before the first attempt.
    /// Attempts never overlap and there is no sleep after the last one.
    pub async fn run<F>(&self, mut on_event: F) -> WatchOutcome
    where
        F: FnMut(&WatchEvent),
    {
        let max = self.policy.max_attempts;
        let watch_start = window_start(self.clock.now(), self.policy.lookback);

        on_event(&WatchEvent::WatchStarted {
            target: self.probe.describe(),
            max_attempts: max,
            check_interval: self.policy.check_interval,
            watch_start,
        });
        tracing::info!(location = %self.probe.describe(), max_attempts = max, %watch_start, "Watch started");

        for attempt in 1..=max {
            let progress = Progress::new(attempt, max);
            on_event(&WatchEvent::AttemptStarted { progress });

            match self.attempt(progress, watch_start, &mut on_event).await {
                Attempt::Fresh(modified_at) => {
                    on_event(&WatchEvent::Detected {
                        progress,
                        modified_at,
                    });
                    return WatchOutcome::Detected { attempt };
                }
                Attempt::Abort(reason) => {
                    on_event(&WatchEvent::Aborted {
                        progress,
                        reason: reason.clone(),
                    });
                    return WatchOutcome::Aborted { attempt, reason };
                }
                Attempt::Retry => {}
            }

            if attempt < max {
                on_event(&WatchEvent::Waiting {
                    progress,
                    interval: self.policy.check_interval,
                });
                self.clock.sleep(self.policy.check_interval).await;
            }
        }

        on_event(&WatchEvent::Exhausted { attempts: max });
        WatchOutcome::Exhausted { attempts: max }
    }

    async fn attempt<F>(&self, progress: Progress, watch_start: DateTime<Utc>, on_event: &mut F) -> Attempt
    where
        F: FnMut(&WatchEvent),
    {
        match self.probe_once().await {
            Ok(ProbeResult { exists: false, .. }) => {
                on_event(&WatchEvent::NotYetPresent { progress });
                Attempt::Retry
            }
            Ok(ProbeResult {
                exists: true,
                modified_at,
            }) => {
                if is_fresh(modified_at, watch_start) {
                    Attempt::Fresh(modified_at)
                } else {
                    on_event(&WatchEvent::StaleTrigger {
                        progress,
                        modified_at,
                        watch_start,
                    });
                    Attempt::Retry
                }
            }
            Err(e) if e.is_not_found() || !e.category().is_error() => {
                on_event(&WatchEvent::NotYetPresent { progress });
                Attempt::Retry
            }
            Err(e) => {
                let category = e.category();
                tracing::warn!(attempt = progress.attempt, %category, error = %e, "Trigger check failed");
                on_event(&WatchEvent::ProbeFailed {
                    progress,
                    category,
                    error: e.to_string(),
                });
                let fail_fast = self.policy.fail_fast_on_auth && category == ErrorCategory::Auth;
                if fail_fast || !category.is_retryable() {
                    Attempt::Abort(e.to_string())
                } else {
                    Attempt::Retry
                }
            }
        }
    }

    async fn probe_once(&self) -> Result<ProbeResult, ProbeError> {
        let probe = Arc::clone(&self.probe);
        match tokio::task::spawn_blocking(move || probe.probe()).await {
            Ok(result) => result,
            Err(e) => Err(ProbeError::Transport(format!("probe task failed: {}", e))),
        }
    }
}

/// Earliest modification time accepted as fresh.
pub fn window_start(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lookback)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A trigger is fresh when its mtime is at or after the window start.
/// Without an mtime freshness cannot be shown.
pub fn is_fresh(modified_at: Option<DateTime<Utc>>, watch_start: DateTime<Utc>) -> bool {
    modified_at.is_some_and(|at| at >= watch_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ManualClock, MockResponse, ScriptedProbe};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    fn policy(max_attempts: u32, lookback_secs: u64) -> PollPolicy {
        PollPolicy {
            check_interval: Duration::from_secs(3),
            max_attempts,
            lookback: Duration::from_secs(lookback_secs),
            fail_fast_on_auth: false,
        }
    }

    #[test]
    fn test_window_start() {
        assert_eq!(
            window_start(start(), Duration::from_secs(7200)),
            start() - chrono::Duration::hours(2)
        );
        assert_eq!(window_start(start(), Duration::ZERO), start());
    }

    #[test]
    fn test_is_fresh_inclusive() {
        let ws = start();
        assert!(is_fresh(Some(ws), ws));
        assert!(!is_fresh(Some(ws - chrono::Duration::seconds(1)), ws));
        assert!(!is_fresh(None, ws));
    }

    #[tokio::test]
    async fn test_detected_on_third_attempt() {
        let probe = ScriptedProbe::new([
            MockResponse::Missing,
            MockResponse::TransportError("reset".into()),
            MockResponse::Present(start()),
        ]);
        let clock = ManualClock::new(start());
        let poller = TriggerPoller::new(Arc::new(probe.clone()), clock.clone(), policy(5, 60));

        let outcome = poller.run(|_| {}).await;
        assert_eq!(outcome, WatchOutcome::Detected { attempt: 3 });
        assert_eq!(probe.calls(), 3);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_then_exhausted() {
        let probe = ScriptedProbe::always(MockResponse::Present(
            start() - chrono::Duration::seconds(61),
        ));
        let clock = ManualClock::new(start());
        let poller = TriggerPoller::new(Arc::new(probe.clone()), clock.clone(), policy(3, 60));

        let mut kinds = Vec::new();
        let outcome = poller.run(|e| kinds.push(e.kind())).await;

        assert_eq!(outcome, WatchOutcome::Exhausted { attempts: 3 });
        assert_eq!(kinds.iter().filter(|k| **k == "stale_trigger").count(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3); 2]);
    }

    #[tokio::test]
    async fn test_auth_failure_retries_by_default() {
        let probe = ScriptedProbe::always(MockResponse::AuthRejected("publickey".into()));
        let poller = TriggerPoller::new(
            Arc::new(probe.clone()),
            ManualClock::new(start()),
            policy(4, 60),
        );
        assert_eq!(poller.run(|_| {}).await, WatchOutcome::Exhausted { attempts: 4 });
        assert_eq!(probe.calls(), 4);
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_when_fail_fast() {
        let probe = ScriptedProbe::always(MockResponse::AuthRejected("publickey".into()));
        let mut fail_fast = policy(4, 60);
        fail_fast.fail_fast_on_auth = true;
        let clock = ManualClock::new(start());
        let poller = TriggerPoller::new(Arc::new(probe.clone()), clock.clone(), fail_fast);

        let outcome = poller.run(|_| {}).await;
        assert!(matches!(outcome, WatchOutcome::Aborted { attempt: 1, .. }));
        assert_eq!(probe.calls(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_error_keeps_polling_quietly() {
        let probe = ScriptedProbe::new([
            MockResponse::NotFound("/outbox/trigger.txt".into()),
            MockResponse::NotFound("/outbox/trigger.txt".into()),
            MockResponse::Present(start()),
        ]);
        let mut fail_fast = policy(5, 60);
        fail_fast.fail_fast_on_auth = true;
        let poller = TriggerPoller::new(Arc::new(probe.clone()), ManualClock::new(start()), fail_fast);

        let mut kinds = Vec::new();
        let outcome = poller.run(|e| kinds.push(e.kind())).await;

        assert_eq!(outcome, WatchOutcome::Detected { attempt: 3 });
        assert_eq!(kinds.iter().filter(|k| **k == "not_yet_present").count(), 2);
        assert!(!kinds.contains(&"probe_failed"));
    }

    #[tokio::test]
    async fn test_transport_failure_never_aborts() {
        let probe = ScriptedProbe::always(MockResponse::TransportError("timeout".into()));
        let mut fail_fast = policy(2, 60);
        fail_fast.fail_fast_on_auth = true;
        let poller = TriggerPoller::new(Arc::new(probe), ManualClock::new(start()), fail_fast);
        assert_eq!(poller.run(|_| {}).await, WatchOutcome::Exhausted { attempts: 2 });
    }
}
