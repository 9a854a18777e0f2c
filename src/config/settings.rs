//! Raw, unvalidated settings from a JSON file and the environment.
//!
//! Both sources produce a [`RawSettings`] in which every field is optional.
//! The file is read first and the environment is laid over it, so an operator
//! can keep a checked-in file and override single values per run. Secrets are
//! never part of `RawSettings`; they are looked up during resolution.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "TRIGGER_WATCH_CONFIG";
pub const ENV_BACKEND: &str = "WATCH_BACKEND";
pub const ENV_BACKEND_ALIAS: &str = "WATCH_TYPE";
pub const ENV_TRIGGER_FILE: &str = "TRIGGER_FILE";
pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL_SECONDS";
pub const ENV_MAX_ATTEMPTS: &str = "MAX_RETRY";
pub const ENV_LOOKBACK_SECONDS: &str = "LOOKBACK_SECONDS";
pub const ENV_LOOKBACK_HOURS: &str = "LOOKBACK_HOURS";
pub const ENV_TARGET_DIR: &str = "TARGET_DIR";
pub const ENV_FAIL_FAST_ON_AUTH: &str = "WATCH_FAIL_FAST_ON_AUTH";
pub const ENV_SFTP_HOST: &str = "SFTP_HOST";
pub const ENV_SFTP_PORT: &str = "SFTP_PORT";
pub const ENV_SFTP_USERNAME: &str = "SFTP_USERNAME";
pub const ENV_SFTP_AUTH_METHOD: &str = "SFTP_AUTH_METHOD";
pub const ENV_SFTP_PASSWORD: &str = "SFTP_PASSWORD";
pub const ENV_SFTP_PRIVATE_KEY_ENV: &str = "SFTP_PRIVATE_KEY_ENV";
pub const ENV_SFTP_PRIVATE_KEY_PASSPHRASE: &str = "SFTP_PRIVATE_KEY_PASSPHRASE";
pub const ENV_SFTP_KEY_ALGORITHMS: &str = "SFTP_KEY_ALGORITHMS";
pub const ENV_SFTP_TARGET_DIR: &str = "SFTP_TARGET_DIR";
pub const ENV_SFTP_TIMEOUT: &str = "SFTP_TIMEOUT_SECONDS";
pub const ENV_SFTP_HOST_KEY: &str = "SFTP_HOST_KEY_SHA256";
pub const ENV_PROXY_ENABLED: &str = "SFTP_USE_HTTP_PROXY";
pub const ENV_PROXY_HOST: &str = "SFTP_HTTP_PROXY_HOST";
pub const ENV_PROXY_PORT: &str = "SFTP_HTTP_PROXY_PORT";
pub const ENV_PROXY_USERNAME: &str = "SFTP_HTTP_PROXY_USERNAME";
pub const ENV_PROXY_PASSWORD: &str = "SFTP_HTTP_PROXY_PASSWORD";

/// Lookup function for environment variables.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Every setting the watcher understands, all optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub backend: Option<String>,
    pub trigger_file: Option<String>,
    pub check_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub lookback_secs: Option<u64>,
    pub directory: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub auth_method: Option<String>,
    pub private_key_env: Option<String>,
    pub key_algorithms: Option<Vec<String>>,
    pub remote_directory: Option<String>,
    pub timeout_secs: Option<u64>,
    pub host_key_fingerprint: Option<String>,
    pub proxy_enabled: Option<bool>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    pub fail_fast_on_auth: Option<bool>,
}

impl RawSettings {
    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::FileParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from a JSON document.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Read settings from environment variables.
    pub fn from_env(env: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let lookback_secs = match parse_var::<u64>(env, ENV_LOOKBACK_SECONDS)? {
            Some(secs) => Some(secs),
            None => parse_hours(env, ENV_LOOKBACK_HOURS)?,
        };

        let key_algorithms = var(env, ENV_SFTP_KEY_ALGORITHMS).map(|list| {
            list.split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        });

        Ok(Self {
            backend: var(env, ENV_BACKEND).or_else(|| var(env, ENV_BACKEND_ALIAS)),
            trigger_file: var(env, ENV_TRIGGER_FILE),
            check_interval_secs: parse_var(env, ENV_CHECK_INTERVAL)?,
            max_attempts: parse_var(env, ENV_MAX_ATTEMPTS)?,
            lookback_secs,
            directory: var(env, ENV_TARGET_DIR).map(PathBuf::from),
            host: var(env, ENV_SFTP_HOST),
            port: parse_var(env, ENV_SFTP_PORT)?,
            username: var(env, ENV_SFTP_USERNAME),
            auth_method: var(env, ENV_SFTP_AUTH_METHOD),
            private_key_env: var(env, ENV_SFTP_PRIVATE_KEY_ENV),
            key_algorithms,
            remote_directory: var(env, ENV_SFTP_TARGET_DIR),
            timeout_secs: parse_var(env, ENV_SFTP_TIMEOUT)?,
            host_key_fingerprint: var(env, ENV_SFTP_HOST_KEY),
            proxy_enabled: parse_flag(env, ENV_PROXY_ENABLED),
            proxy_host: var(env, ENV_PROXY_HOST),
            proxy_port: parse_var(env, ENV_PROXY_PORT)?,
            proxy_username: var(env, ENV_PROXY_USERNAME),
            fail_fast_on_auth: parse_flag(env, ENV_FAIL_FAST_ON_AUTH),
        })
    }

    /// Lay `over` on top of `self`: every value set in `over` wins.
    pub fn overlay(self, over: RawSettings) -> RawSettings {
        RawSettings {
            backend: over.backend.or(self.backend),
            trigger_file: over.trigger_file.or(self.trigger_file),
            check_interval_secs: over.check_interval_secs.or(self.check_interval_secs),
            max_attempts: over.max_attempts.or(self.max_attempts),
            lookback_secs: over.lookback_secs.or(self.lookback_secs),
            directory: over.directory.or(self.directory),
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            username: over.username.or(self.username),
            auth_method: over.auth_method.or(self.auth_method),
            private_key_env: over.private_key_env.or(self.private_key_env),
            key_algorithms: over.key_algorithms.or(self.key_algorithms),
            remote_directory: over.remote_directory.or(self.remote_directory),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
            host_key_fingerprint: over.host_key_fingerprint.or(self.host_key_fingerprint),
            proxy_enabled: over.proxy_enabled.or(self.proxy_enabled),
            proxy_host: over.proxy_host.or(self.proxy_host),
            proxy_port: over.proxy_port.or(self.proxy_port),
            proxy_username: over.proxy_username.or(self.proxy_username),
            fail_fast_on_auth: over.fail_fast_on_auth.or(self.fail_fast_on_auth),
        }
    }
}

/// Non-empty, trimmed value of an environment variable.
pub(crate) fn var(env: EnvLookup<'_>, key: &str) -> Option<String> {
    env(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(env: EnvLookup<'_>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(env, key) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            }),
    }
}

fn parse_hours(env: EnvLookup<'_>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(hours) = parse_var::<f64>(env, key)? else {
        return Ok(None);
    };
    if !hours.is_finite() || hours < 0.0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: hours.to_string(),
            reason: "must be a non-negative number of hours".to_string(),
        });
    }
    Ok(Some((hours * 3600.0).round() as u64))
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
fn parse_flag(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    var(env, key).map(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_env_reads_common_settings() {
        let env = lookup(&[
            (ENV_BACKEND, "local"),
            (ENV_TRIGGER_FILE, "done.flag"),
            (ENV_CHECK_INTERVAL, "5"),
            (ENV_MAX_ATTEMPTS, "4"),
            (ENV_TARGET_DIR, "/data/in"),
        ]);
        let raw = RawSettings::from_env(&env).unwrap();
        assert_eq!(raw.backend.as_deref(), Some("local"));
        assert_eq!(raw.trigger_file.as_deref(), Some("done.flag"));
        assert_eq!(raw.check_interval_secs, Some(5));
        assert_eq!(raw.max_attempts, Some(4));
        assert_eq!(raw.directory, Some(PathBuf::from("/data/in")));
    }

    #[test]
    fn test_watch_type_alias() {
        let env = lookup(&[(ENV_BACKEND_ALIAS, "sftp")]);
        let raw = RawSettings::from_env(&env).unwrap();
        assert_eq!(raw.backend.as_deref(), Some("sftp"));
    }

    #[test]
    fn test_lookback_hours_and_seconds() {
        let env = lookup(&[(ENV_LOOKBACK_HOURS, "1.5")]);
        assert_eq!(RawSettings::from_env(&env).unwrap().lookback_secs, Some(5400));

        let env = lookup(&[(ENV_LOOKBACK_HOURS, "2"), (ENV_LOOKBACK_SECONDS, "0")]);
        assert_eq!(RawSettings::from_env(&env).unwrap().lookback_secs, Some(0));

        let env = lookup(&[(ENV_LOOKBACK_HOURS, "-1")]);
        assert!(RawSettings::from_env(&env).is_err());
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let env = lookup(&[(ENV_MAX_ATTEMPTS, "ten")]);
        let err = RawSettings::from_env(&env).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, ENV_MAX_ATTEMPTS);
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_proxy_flag_values() {
        for (value, expected) in [("1", true), ("TRUE", true), ("on", true), ("no", false), ("0", false)] {
            let env = lookup(&[(ENV_PROXY_ENABLED, value)]);
            assert_eq!(
                RawSettings::from_env(&env).unwrap().proxy_enabled,
                Some(expected),
                "value {}",
                value
            );
        }
    }

    #[test]
    fn test_blank_values_are_unset() {
        let env = lookup(&[(ENV_SFTP_HOST, "   "), (ENV_SFTP_PORT, "")]);
        let raw = RawSettings::from_env(&env).unwrap();
        assert!(raw.host.is_none());
        assert!(raw.port.is_none());
    }

    #[test]
    fn test_key_algorithm_list() {
        let env = lookup(&[(ENV_SFTP_KEY_ALGORITHMS, "ed25519, rsa,,")]);
        let raw = RawSettings::from_env(&env).unwrap();
        assert_eq!(
            raw.key_algorithms,
            Some(vec!["ed25519".to_string(), "rsa".to_string()])
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        assert!(RawSettings::from_json(r#"{"backend": "local", "colour": "red"}"#).is_err());

        let raw = RawSettings::from_json(r#"{"backend": "remote", "port": 2222}"#).unwrap();
        assert_eq!(raw.port, Some(2222));
    }

    #[test]
    fn test_overlay_prefers_later_source() {
        let file = RawSettings {
            backend: Some("remote".to_string()),
            host: Some("file-host".to_string()),
            port: Some(2222),
            ..Default::default()
        };
        let env = RawSettings {
            host: Some("env-host".to_string()),
            ..Default::default()
        };

        let merged = file.overlay(env);
        assert_eq!(merged.backend.as_deref(), Some("remote"));
        assert_eq!(merged.host.as_deref(), Some("env-host"));
        assert_eq!(merged.port, Some(2222));
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let err = RawSettings::from_file(Path::new("/nonexistent/watch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
