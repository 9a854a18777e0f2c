//! Resolved, validated watch configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::credential::{AuthMethod, Credential, Secret};
use super::settings::{
    EnvLookup, RawSettings, ENV_PROXY_PASSWORD, ENV_SFTP_HOST, ENV_SFTP_PASSWORD,
    ENV_SFTP_PRIVATE_KEY_PASSPHRASE, ENV_SFTP_TARGET_DIR, ENV_SFTP_USERNAME, ENV_TARGET_DIR,
};
use crate::auth::KeyAlgorithm;
use crate::error::ConfigError;

pub const DEFAULT_TRIGGER_FILE: &str = "trigger.txt";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_LOOKBACK_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_SFTP_PORT: u16 = 22;
pub const DEFAULT_PROXY_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "SFTP_PRIVATE_KEY";

/// Which backend to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" | "sftp" => Ok(BackendKind::Remote),
            _ => Err(ConfigError::UnsupportedBackend(s.trim().to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// Local filesystem backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub directory: PathBuf,
}

/// Forward HTTP proxy for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret>,
}

/// SFTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
    /// Order in which private key parsers are tried.
    pub key_order: Vec<KeyAlgorithm>,
    pub remote_directory: String,
    /// Bound for connect, proxy dialogue and every SSH/SFTP operation.
    pub timeout: Duration,
    /// Pinned SHA-256 host key fingerprint (base64, no padding).
    pub host_key_fingerprint: Option<String>,
    pub proxy: Option<ProxyConfig>,
}

impl RemoteConfig {
    /// The proxy to tunnel through, if one is enabled.
    pub fn active_proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref().filter(|proxy| proxy.enabled)
    }
}

/// Backend sub-configuration; exactly one variant per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local(LocalConfig),
    Remote(RemoteConfig),
}

/// Complete configuration for one watch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub trigger_filename: String,
    pub check_interval: Duration,
    pub max_attempts: u32,
    pub lookback: Duration,
    /// End the watch on the first authentication failure instead of retrying.
    pub fail_fast_on_auth: bool,
    pub backend: BackendConfig,
}

impl WatchConfig {
    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            BackendConfig::Local(_) => BackendKind::Local,
            BackendConfig::Remote(_) => BackendKind::Remote,
        }
    }

    /// Validate raw settings and pull secrets from the environment.
    pub fn resolve(raw: &RawSettings, env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let kind = match raw.backend.as_deref() {
            Some(name) => name.parse::<BackendKind>()?,
            None => BackendKind::Local,
        };

        let trigger_filename = raw
            .trigger_file
            .clone()
            .unwrap_or_else(|| DEFAULT_TRIGGER_FILE.to_string());
        if trigger_filename.trim().is_empty() {
            return Err(ConfigError::MissingValue { key: "TRIGGER_FILE" });
        }

        let max_attempts = raw.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_RETRY",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let backend = match kind {
            BackendKind::Local => BackendConfig::Local(resolve_local(raw)?),
            BackendKind::Remote => BackendConfig::Remote(resolve_remote(raw, env)?),
        };

        Ok(Self {
            trigger_filename,
            check_interval: Duration::from_secs(
                raw.check_interval_secs.unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
            ),
            max_attempts,
            lookback: Duration::from_secs(raw.lookback_secs.unwrap_or(DEFAULT_LOOKBACK_SECS)),
            fail_fast_on_auth: raw.fail_fast_on_auth.unwrap_or(false),
            backend,
        })
    }
}

fn resolve_local(raw: &RawSettings) -> Result<LocalConfig, ConfigError> {
    let directory = raw
        .directory
        .clone()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or(ConfigError::MissingValue {
            key: ENV_TARGET_DIR,
        })?;
    Ok(LocalConfig { directory })
}

fn resolve_remote(raw: &RawSettings, env: EnvLookup<'_>) -> Result<RemoteConfig, ConfigError> {
    let host = required(&raw.host, ENV_SFTP_HOST)?;
    let username = required(&raw.username, ENV_SFTP_USERNAME)?;
    let remote_directory = required(&raw.remote_directory, ENV_SFTP_TARGET_DIR)?;

    let method = match raw.auth_method.as_deref() {
        Some(name) => name.parse::<AuthMethod>()?,
        None => AuthMethod::Password,
    };
    let credential = resolve_credential(method, raw, env)?;

    let key_order = match &raw.key_algorithms {
        None => KeyAlgorithm::DEFAULT_ORDER.to_vec(),
        Some(names) => parse_key_order(names)?,
    };

    let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "SFTP_TIMEOUT_SECONDS",
            value: "0".to_string(),
            reason: "timeout must be at least one second".to_string(),
        });
    }

    Ok(RemoteConfig {
        host,
        port: raw.port.unwrap_or(DEFAULT_SFTP_PORT),
        username,
        credential,
        key_order,
        remote_directory,
        timeout: Duration::from_secs(timeout_secs),
        host_key_fingerprint: raw
            .host_key_fingerprint
            .as_deref()
            .map(normalize_fingerprint)
            .filter(|fp| !fp.is_empty()),
        proxy: resolve_proxy(raw, env)?,
    })
}

fn resolve_credential(
    method: AuthMethod,
    raw: &RawSettings,
    env: EnvLookup<'_>,
) -> Result<Credential, ConfigError> {
    match method {
        AuthMethod::Password => {
            let password = env(ENV_SFTP_PASSWORD).unwrap_or_default();
            if password.is_empty() {
                return Err(ConfigError::MissingSecret {
                    variable: ENV_SFTP_PASSWORD.to_string(),
                });
            }
            Ok(Credential::Password(Secret::new(password)))
        }
        AuthMethod::PrivateKey => {
            let source_env = raw
                .private_key_env
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIVATE_KEY_ENV.to_string());
            let material = env(&source_env).unwrap_or_default();
            if material.trim().is_empty() {
                return Err(ConfigError::MissingSecret {
                    variable: source_env,
                });
            }
            let passphrase = env(ENV_SFTP_PRIVATE_KEY_PASSPHRASE)
                .filter(|p| !p.is_empty())
                .map(Secret::new);
            Ok(Credential::PrivateKey {
                material: Secret::new(material),
                passphrase,
                source_env,
            })
        }
    }
}

fn resolve_proxy(raw: &RawSettings, env: EnvLookup<'_>) -> Result<Option<ProxyConfig>, ConfigError> {
    let enabled = raw.proxy_enabled.unwrap_or(false);
    let host = raw.proxy_host.clone().unwrap_or_default();

    if enabled && host.trim().is_empty() {
        return Err(ConfigError::ProxyHostMissing);
    }
    if !enabled && host.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(ProxyConfig {
        enabled,
        host: host.trim().to_string(),
        port: raw.proxy_port.unwrap_or(DEFAULT_PROXY_PORT),
        username: raw.proxy_username.clone().filter(|u| !u.is_empty()),
        password: env(ENV_PROXY_PASSWORD).map(Secret::new),
    }))
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingValue { key })
}

fn parse_key_order(names: &[String]) -> Result<Vec<KeyAlgorithm>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "SFTP_KEY_ALGORITHMS",
            value: String::new(),
            reason: "at least one key algorithm is required".to_string(),
        });
    }
    names
        .iter()
        .map(|name| {
            name.parse::<KeyAlgorithm>()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: "SFTP_KEY_ALGORITHMS",
                    value: name.clone(),
                    reason,
                })
        })
        .collect()
}

/// Strip the `SHA256:` prefix and base64 padding OpenSSH tools print.
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    let trimmed = fingerprint.trim();
    let body = trimmed
        .strip_prefix("SHA256:")
        .or_else(|| trimmed.strip_prefix("sha256:"))
        .unwrap_or(trimmed);
    body.trim_end_matches('=').to_string()
}

impl fmt::Display for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "backend:          {}", self.backend_kind())?;
        writeln!(f, "trigger file:     {}", self.trigger_filename)?;
        writeln!(f, "check interval:   {}s", self.check_interval.as_secs())?;
        writeln!(f, "max attempts:     {}", self.max_attempts)?;
        writeln!(f, "lookback:         {}s", self.lookback.as_secs())?;
        writeln!(f, "fail fast (auth): {}", self.fail_fast_on_auth)?;

        match &self.backend {
            BackendConfig::Local(local) => {
                writeln!(f, "directory:        {}", local.directory.display())?;
            }
            BackendConfig::Remote(remote) => {
                writeln!(f, "server:           {}@{}:{}", remote.username, remote.host, remote.port)?;
                writeln!(f, "remote directory: {}", remote.remote_directory)?;
                match &remote.credential {
                    Credential::Password(_) => writeln!(f, "auth:             password")?,
                    Credential::PrivateKey {
                        source_env,
                        passphrase,
                        ..
                    } => {
                        let order: Vec<String> =
                            remote.key_order.iter().map(ToString::to_string).collect();
                        writeln!(
                            f,
                            "auth:             private key from ${} ({}, passphrase: {})",
                            source_env,
                            order.join(" > "),
                            if passphrase.is_some() { "yes" } else { "no" }
                        )?;
                    }
                }
                writeln!(f, "timeout:          {}s", remote.timeout.as_secs())?;
                if let Some(fp) = &remote.host_key_fingerprint {
                    writeln!(f, "host key:         SHA256:{}", fp)?;
                }
                match remote.active_proxy() {
                    Some(proxy) => writeln!(
                        f,
                        "proxy:            {}:{}{}",
                        proxy.host,
                        proxy.port,
                        if proxy.username.is_some() { " (basic auth)" } else { "" }
                    )?,
                    None => writeln!(f, "proxy:            none")?,
                }
            }
        }
        Ok(())
    }
}
