//! Watch configuration.
//!
//! Settings come from an optional JSON file, overlaid by environment
//! variables, then resolved into a validated [`WatchConfig`]. Secrets
//! (passwords, key material, passphrases) are only ever read from the
//! environment.

mod credential;
mod settings;
mod watch;

use std::path::{Path, PathBuf};

pub use credential::{AuthMethod, Credential, Secret};
pub use settings::*;
pub use watch::{
    normalize_fingerprint, BackendConfig, BackendKind, LocalConfig, ProxyConfig, RemoteConfig,
    WatchConfig, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_LOOKBACK_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_PRIVATE_KEY_ENV, DEFAULT_PROXY_PORT, DEFAULT_SFTP_PORT, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TRIGGER_FILE,
};

use crate::error::ConfigError;

/// Load and resolve the watch configuration.
///
/// `config_path` falls back to `$TRIGGER_WATCH_CONFIG`. Environment values
/// override file values.
pub fn load(config_path: Option<&Path>, env: EnvLookup<'_>) -> Result<WatchConfig, ConfigError> {
    let file_path = config_path
        .map(Path::to_path_buf)
        .or_else(|| settings::var(env, ENV_CONFIG_PATH).map(PathBuf::from));

    let from_file = match &file_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Reading config file");
            RawSettings::from_file(path)?
        }
        None => RawSettings::default(),
    };

    let raw = from_file.overlay(RawSettings::from_env(env)?);
    WatchConfig::resolve(&raw, env)
}
