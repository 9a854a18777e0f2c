//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`LocalProbe`] - Trigger check on the local filesystem
//! - [`SftpProbe`] - Trigger check over SFTP, direct or through an HTTP proxy
//! - [`SystemClock`] - Wall-clock time and tokio sleeps
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::ScriptedProbe`] - Scripted probe outcomes
//! - [`mock::ManualClock`] - Virtual time

pub mod local_fs;
pub mod mock;
pub mod scope;
pub mod sftp;
pub mod system_clock;

use std::sync::Arc;

pub use local_fs::LocalProbe;
pub use mock::{ManualClock, MockResponse, ScriptedProbe};
pub use scope::AttemptScope;
pub use sftp::SftpProbe;
pub use system_clock::SystemClock;

use crate::config::{BackendConfig, WatchConfig};
use crate::traits::TriggerProbe;

/// Build the probe for the configured backend.
pub fn build_probe(config: &WatchConfig) -> Arc<dyn TriggerProbe> {
    match &config.backend {
        BackendConfig::Local(local) => {
            Arc::new(LocalProbe::new(&local.directory, &config.trigger_filename))
        }
        BackendConfig::Remote(remote) => {
            Arc::new(SftpProbe::new(remote, &config.trigger_filename))
        }
    }
}
