//! SSH session establishment over an already-open stream.

use std::net::TcpStream;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use ssh2::{HashType, Session};

use super::keys::{KeyLoader, LoadedKey};
use crate::config::Credential;
use crate::error::AuthError;

/// Credential prepared for libssh2, checked before touching the network.
enum Prepared<'a> {
    Password(&'a str),
    Key(LoadedKey),
}

/// Negotiates an SSH session and authenticates it.
#[derive(Debug, Clone)]
pub struct Authenticator {
    key_loader: KeyLoader,
    timeout: Duration,
    host_key_fingerprint: Option<String>,
}

impl Authenticator {
    pub fn new(key_loader: KeyLoader, timeout: Duration) -> Self {
        Self {
            key_loader,
            timeout,
            host_key_fingerprint: None,
        }
    }

    /// Require the server host key to hash to this SHA-256 fingerprint.
    pub fn with_host_key_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.host_key_fingerprint = fingerprint;
        self
    }

    /// Handshake over `stream` and log in as `username`.
    ///
    /// Key material is parsed before the handshake so that an unusable key
    /// never costs a round trip to the server.
    ///
    /// # Returns
    /// * `Ok(Session)` - An authenticated session
    /// * `Err(AuthError::KeyLoadFailed)` - No key parser accepted the material
    /// * `Err(AuthError::Handshake)` - SSH negotiation failed
    /// * `Err(AuthError::Rejected)` - The server refused the credential
    pub fn authenticate(
        &self,
        stream: TcpStream,
        username: &str,
        credential: &Credential,
    ) -> Result<Session, AuthError> {
        let prepared = self.prepare(credential)?;

        let mut session = Session::new().map_err(|e| AuthError::Handshake(e.to_string()))?;
        session.set_timeout(timeout_millis(self.timeout));
        session.set_tcp_stream(stream);
        session
            .handshake()
            .map_err(|e| AuthError::Handshake(e.to_string()))?;

        self.verify_host_key(&session)?;

        match &prepared {
            Prepared::Password(password) => {
                tracing::debug!(username, "Authenticating with password");
                session
                    .userauth_password(username, password)
                    .map_err(|e| AuthError::Rejected(e.to_string()))?;
            }
            Prepared::Key(key) => {
                tracing::debug!(username, algorithm = %key.algorithm, "Authenticating with private key");
                session
                    .userauth_pubkey_memory(
                        username,
                        None,
                        &key.material,
                        key.passphrase.as_deref(),
                    )
                    .map_err(|e| AuthError::Rejected(format!("{} key: {}", key.algorithm, e)))?;
            }
        }

        if !session.authenticated() {
            return Err(AuthError::Rejected(
                "not authenticated after userauth".to_string(),
            ));
        }

        Ok(session)
    }

    fn prepare<'a>(&self, credential: &'a Credential) -> Result<Prepared<'a>, AuthError> {
        match credential {
            Credential::Password(password) => {
                if password.is_empty() {
                    return Err(AuthError::MissingSecret {
                        what: "SFTP password".to_string(),
                    });
                }
                Ok(Prepared::Password(password.expose()))
            }
            Credential::PrivateKey {
                material,
                passphrase,
                source_env,
            } => {
                if material.expose().trim().is_empty() {
                    return Err(AuthError::MissingSecret {
                        what: format!("private key in ${}", source_env),
                    });
                }
                let key = self.key_loader.load(
                    material.expose(),
                    passphrase.as_ref().map(|p| p.expose()),
                )?;
                Ok(Prepared::Key(key))
            }
        }
    }

    fn verify_host_key(&self, session: &Session) -> Result<(), AuthError> {
        let Some(expected) = &self.host_key_fingerprint else {
            return Ok(());
        };
        let actual = session
            .host_key_hash(HashType::Sha256)
            .map(|hash| STANDARD_NO_PAD.encode(hash))
            .unwrap_or_default();

        if fingerprints_match(expected, &actual) {
            Ok(())
        } else {
            Err(AuthError::HostKeyMismatch {
                expected: format!("SHA256:{}", expected),
                actual: format!("SHA256:{}", actual),
            })
        }
    }
}

fn fingerprints_match(expected: &str, actual: &str) -> bool {
    !actual.is_empty() && expected.trim_end_matches('=') == actual.trim_end_matches('=')
}

/// libssh2 takes milliseconds as `u32`; zero would mean "no timeout".
fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use std::net::TcpListener;

    fn connected_stream() -> (TcpStream, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        (stream, listener)
    }

    #[test]
    fn test_unparseable_key_fails_before_handshake() {
        let (stream, listener) = connected_stream();
        let auth = Authenticator::new(KeyLoader::default(), Duration::from_secs(2));
        let credential = Credential::PrivateKey {
            material: Secret::new("not a key"),
            passphrase: None,
            source_env: "SFTP_PRIVATE_KEY".to_string(),
        };

        let err = auth
            .authenticate(stream, "batch", &credential)
            .err()
            .expect("authentication should fail");
        match err {
            AuthError::KeyLoadFailed(diagnostics) => assert_eq!(diagnostics.len(), 4),
            other => panic!("unexpected error {:?}", other),
        }

        // Nothing was written to the server side.
        let (mut accepted, _) = listener.accept().unwrap();
        accepted
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = [0u8; 16];
        let read = std::io::Read::read(&mut accepted, &mut buf).unwrap_or(0);
        assert_eq!(read, 0);
    }

    #[test]
    fn test_empty_password_is_missing_secret() {
        let (stream, _listener) = connected_stream();
        let auth = Authenticator::new(KeyLoader::default(), Duration::from_secs(2));
        let err = auth
            .authenticate(stream, "batch", &Credential::Password(Secret::default()))
            .err()
            .expect("authentication should fail");
        assert!(matches!(err, AuthError::MissingSecret { .. }));
    }

    #[test]
    fn test_handshake_failure_on_non_ssh_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let _ = std::io::Write::write_all(&mut socket, b"HTTP/1.1 400 Bad Request\r\n\r\n");
        });

        let stream = TcpStream::connect(addr).unwrap();
        let auth = Authenticator::new(KeyLoader::default(), Duration::from_secs(2));
        let err = auth
            .authenticate(stream, "batch", &Credential::Password(Secret::new("pw")))
            .err()
            .expect("authentication should fail");
        assert!(matches!(err, AuthError::Handshake(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_fingerprint_comparison_ignores_padding() {
        assert!(fingerprints_match("abc", "abc="));
        assert!(!fingerprints_match("abc", ""));
        assert!(!fingerprints_match("abc", "abd"));
    }

    #[test]
    fn test_timeout_millis_is_never_zero() {
        assert_eq!(timeout_millis(Duration::ZERO), 1);
        assert_eq!(timeout_millis(Duration::from_secs(30)), 30_000);
    }
}
