//! HTTP/1.1 CONNECT tunnel through a forward proxy.
//!
//! The proxy dialogue is:
//!
//! ```text
//! CONNECT sftp.example.com:22 HTTP/1.1
//! Host: sftp.example.com:22
//! Proxy-Connection: Keep-Alive
//! Proxy-Authorization: Basic dXNlcjpwYXNz   (only with proxy credentials)
//!
//! HTTP/1.1 200 Connection Established
//! ```
//!
//! After the blank line the socket is a transparent relay to the target.
//! The response head is read with `peek` and only the bytes up to the
//! terminator are consumed, so nothing the target already sent is lost.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::connect_with_timeout;
use crate::error::TunnelError;

/// Largest response head we accept before giving up (64 KiB).
pub const MAX_RESPONSE_HEAD_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Username/password for proxy Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A connected stream that relays bytes to the tunnel target.
#[derive(Debug)]
pub struct TunneledStream {
    stream: TcpStream,
}

impl TunneledStream {
    /// Give up the wrapper and return the underlying socket.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }

    /// Borrow the underlying socket.
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }
}

impl Read for TunneledStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TunneledStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Forward proxy able to open CONNECT tunnels.
#[derive(Debug, Clone)]
pub struct HttpConnectTunnel {
    proxy_host: String,
    proxy_port: u16,
    credentials: Option<ProxyCredentials>,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
}

impl HttpConnectTunnel {
    /// Create a tunnel establisher for the given proxy.
    pub fn new(proxy_host: impl Into<String>, proxy_port: u16, connect_timeout: Duration) -> Self {
        Self {
            proxy_host: proxy_host.into(),
            proxy_port,
            credentials: None,
            connect_timeout,
            io_timeout: None,
        }
    }

    /// Authenticate to the proxy with Basic credentials.
    pub fn with_credentials(mut self, credentials: Option<ProxyCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Bound every read/write on the proxy socket.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// `host:port` of the proxy.
    pub fn proxy_address(&self) -> String {
        format!("{}:{}", self.proxy_host, self.proxy_port)
    }

    /// Open a tunnel to `target_host:target_port`.
    ///
    /// # Returns
    /// * `Ok(TunneledStream)` - The proxy answered 200; the stream now relays to the target
    /// * `Err(TunnelError)` - Connect failure, I/O failure, malformed or refused response
    pub fn establish(
        &self,
        target_host: &str,
        target_port: u16,
    ) -> Result<TunneledStream, TunnelError> {
        let mut stream = connect_with_timeout(&self.proxy_host, self.proxy_port, self.connect_timeout)
            .map_err(|source| TunnelError::Connect {
                proxy: self.proxy_address(),
                source,
            })?;

        if let Some(timeout) = self.io_timeout {
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
        }

        let request = build_connect_request(target_host, target_port, self.credentials.as_ref());
        stream.write_all(request.as_bytes())?;
        stream.flush()?;
        tracing::debug!(
            proxy = %self.proxy_address(),
            target = %format!("{}:{}", target_host, target_port),
            "Sent CONNECT request"
        );

        let head = read_response_head(&mut stream)?;
        let status_line = status_line(&head);

        if !is_success_status(&status_line) {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            return Err(TunnelError::Rejected { status_line });
        }

        tracing::debug!(status = %status_line, "HTTP proxy tunnel established");

        if self.io_timeout.is_some() {
            stream.set_read_timeout(None)?;
            stream.set_write_timeout(None)?;
        }

        Ok(TunneledStream { stream })
    }
}

/// Render the CONNECT request, including the terminating blank line.
pub fn build_connect_request(
    target_host: &str,
    target_port: u16,
    credentials: Option<&ProxyCredentials>,
) -> String {
    let authority = format!("{}:{}", target_host, target_port);
    let mut lines = vec![
        format!("CONNECT {} HTTP/1.1", authority),
        format!("Host: {}", authority),
        "Proxy-Connection: Keep-Alive".to_string(),
    ];

    if let Some(creds) = credentials {
        let token = STANDARD.encode(format!("{}:{}", creds.username, creds.password));
        lines.push(format!("Proxy-Authorization: Basic {}", token));
    }

    let mut request = lines.join("\r\n");
    request.push_str("\r\n\r\n");
    request
}

/// True when the status line carries exactly status code 200.
pub fn is_success_status(status_line: &str) -> bool {
    status_line.contains(" 200 ") || status_line.ends_with(" 200")
}

/// First line of the response head, decoded as ISO-8859-1.
fn status_line(head: &[u8]) -> String {
    let end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(head.len());
    head[..end].iter().map(|&b| b as char).collect()
}

/// Read the response head, consuming nothing past the blank line.
fn read_response_head(stream: &mut TcpStream) -> Result<Vec<u8>, TunnelError> {
    let mut head: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        // Never pull in more than one byte past the limit.
        let window = READ_CHUNK.min(MAX_RESPONSE_HEAD_BYTES + 1 - head.len());
        let peeked = stream.peek(&mut chunk[..window])?;
        if peeked == 0 {
            return Err(TunnelError::Truncated {
                received: head.len(),
            });
        }

        let take = match terminator_end(&head, &chunk[..peeked]) {
            Some(end) => end,
            None => peeked,
        };

        stream.read_exact(&mut chunk[..take])?;
        head.extend_from_slice(&chunk[..take]);

        if head.len() > MAX_RESPONSE_HEAD_BYTES {
            return Err(TunnelError::HeaderTooLarge {
                limit: MAX_RESPONSE_HEAD_BYTES,
            });
        }

        if head.ends_with(HEAD_TERMINATOR) {
            return Ok(head);
        }
    }
}

/// Number of bytes of `incoming` to consume so that `head + incoming[..n]`
/// ends exactly at the first `\r\n\r\n`, if the terminator is complete.
///
/// `head` never contains a full terminator, but may end with a partial one.
fn terminator_end(head: &[u8], incoming: &[u8]) -> Option<usize> {
    let carry = head.len().min(HEAD_TERMINATOR.len() - 1);
    let mut window = Vec::with_capacity(carry + incoming.len());
    window.extend_from_slice(&head[head.len() - carry..]);
    window.extend_from_slice(incoming);

    window
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| pos + HEAD_TERMINATOR.len() - carry)
}
