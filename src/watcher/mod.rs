//! Trigger watching.
//!
//! [`run`] turns a resolved configuration into a probe and drives the
//! [`TriggerPoller`] until a terminal [`WatchOutcome`]. Progress is reported
//! through a caller-supplied event callback.

mod events;
mod outcome;
mod poller;

pub use events::{EventLevel, Progress, WatchEvent};
pub use outcome::WatchOutcome;
pub use poller::{is_fresh, window_start, PollPolicy, TriggerPoller};

use crate::adapters::build_probe;
use crate::config::WatchConfig;
use crate::error::ConfigError;
use crate::traits::Clock;

/// Run one watch.
///
/// A configuration error ends the watch immediately with
/// `WatchOutcome::ConfigError` and no attempts.
pub async fn run<C, F>(
    config: Result<WatchConfig, ConfigError>,
    clock: C,
    mut on_event: F,
) -> WatchOutcome
where
    C: Clock,
    F: FnMut(&WatchEvent),
{
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration rejected");
            let reason = e.to_string();
            on_event(&WatchEvent::ConfigRejected {
                reason: reason.clone(),
            });
            return WatchOutcome::ConfigError(reason);
        }
    };

    tracing::debug!(backend = %config.backend_kind(), "Configuration resolved");
    let poller = TriggerPoller::new(build_probe(&config), clock, PollPolicy::from(&config));
    poller.run(on_event).await
}
