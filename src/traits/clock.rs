//! Time source trait abstraction.
//!
//! The poller reads the current time once to anchor the lookback window and
//! sleeps between attempts. Routing both through this trait lets tests drive
//! the loop without waiting on the wall clock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for reading the current time and sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for `duration`. Dropping the future cancels the sleep.
    async fn sleep(&self, duration: Duration);
}
