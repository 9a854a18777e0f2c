//! SFTP probe, optionally tunneled through an HTTP proxy.

use std::net::{Shutdown, TcpStream};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ssh2::{ErrorCode, FileStat};

use super::scope::AttemptScope;
use crate::auth::{Authenticator, KeyLoader};
use crate::config::{Credential, RemoteConfig};
use crate::error::ProbeError;
use crate::traits::{ProbeResult, TriggerProbe};
use crate::tunnel::{connect_with_timeout, HttpConnectTunnel, ProxyCredentials};

/// Time allowed for the TCP connect to the proxy.
pub const PROXY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// libssh2 SFTP status codes meaning "does not exist".
const FX_NO_SUCH_FILE: i32 = 2;
const FX_NO_SUCH_PATH: i32 = 10;

/// Checks `<remote_directory>/<filename>` over SFTP.
///
/// Every call opens a fresh connection and session and tears both down
/// before returning.
pub struct SftpProbe {
    host: String,
    port: u16,
    username: String,
    credential: Credential,
    remote_path: String,
    timeout: Duration,
    authenticator: Authenticator,
    tunnel: Option<HttpConnectTunnel>,
}

impl SftpProbe {
    pub fn new(config: &RemoteConfig, filename: &str) -> Self {
        let tunnel = config.active_proxy().map(|proxy| {
            let credentials = proxy.username.as_ref().map(|username| ProxyCredentials {
                username: username.clone(),
                password: proxy
                    .password
                    .as_ref()
                    .map(|p| p.expose().to_string())
                    .unwrap_or_default(),
            });
            HttpConnectTunnel::new(proxy.host.clone(), proxy.port, PROXY_CONNECT_TIMEOUT)
                .with_credentials(credentials)
                .with_io_timeout(config.timeout)
        });

        let authenticator = Authenticator::new(KeyLoader::new(config.key_order.clone()), config.timeout)
            .with_host_key_fingerprint(config.host_key_fingerprint.clone());

        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            credential: config.credential.clone(),
            remote_path: remote_path(&config.remote_directory, filename),
            timeout: config.timeout,
            authenticator,
            tunnel,
        }
    }

    /// Full remote path being watched.
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    fn open_stream(&self) -> Result<TcpStream, ProbeError> {
        let stream = match &self.tunnel {
            Some(tunnel) => {
                tracing::debug!(proxy = %tunnel.proxy_address(), "Connecting through HTTP proxy");
                tunnel.establish(&self.host, self.port)?.into_inner()
            }
            None => connect_with_timeout(&self.host, self.port, self.timeout).map_err(|source| {
                ProbeError::Connect {
                    address: format!("{}:{}", self.host, self.port),
                    source,
                }
            })?,
        };

        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|source| ProbeError::Connect {
                address: format!("{}:{}", self.host, self.port),
                source,
            })?;
        Ok(stream)
    }
}

impl TriggerProbe for SftpProbe {
    fn probe(&self) -> Result<ProbeResult, ProbeError> {
        let mut scope = AttemptScope::new();

        let stream = self.open_stream()?;
        if let Ok(handle) = stream.try_clone() {
            scope.defer("socket", move || {
                let _ = handle.shutdown(Shutdown::Both);
            });
        }

        let session = self
            .authenticator
            .authenticate(stream, &self.username, &self.credential)?;
        let closer = session.clone();
        scope.defer("ssh session", move || {
            let _ = closer.disconnect(None, "trigger check complete", None);
        });

        // Declared after `scope`, so the channel closes before the session.
        let sftp = session.sftp().map_err(|source| ProbeError::Ssh {
            operation: "subsystem start",
            source,
        })?;

        stat_outcome(sftp.stat(Path::new(&self.remote_path)), &self.remote_path)
    }

    fn describe(&self) -> String {
        format!("sftp://{}@{}:{}{}", self.username, self.host, self.port, self.remote_path)
    }
}

/// Map an SFTP stat reply onto a probe result.
///
/// "No such file" and "no such path" become [`ProbeError::NotFound`]; any
/// other status is a transport failure.
fn stat_outcome(stat: Result<FileStat, ssh2::Error>, path: &str) -> Result<ProbeResult, ProbeError> {
    match stat {
        Ok(stat) => Ok(match stat.mtime {
            Some(secs) => match DateTime::<Utc>::from_timestamp(secs as i64, 0) {
                Some(at) => ProbeResult::present(at),
                None => ProbeResult::present_without_mtime(),
            },
            None => ProbeResult::present_without_mtime(),
        }),
        Err(e) if is_no_such_file(&e) => Err(ProbeError::NotFound {
            path: path.to_string(),
        }),
        Err(source) => Err(ProbeError::Ssh {
            operation: "stat",
            source,
        }),
    }
}

fn is_no_such_file(error: &ssh2::Error) -> bool {
    matches!(
        error.code(),
        ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH)
    )
}

/// Join the remote directory and filename with exactly one `/`.
pub fn remote_path(directory: &str, filename: &str) -> String {
    format!("{}/{}", directory.trim_end_matches('/'), filename)
}
