//! Raw TCP connectivity for the remote backend.
//!
//! - [`connect_with_timeout`] - bounded direct connection to a host
//! - [`HttpConnectTunnel`] - CONNECT tunnel through a forward HTTP proxy

mod http_connect;

pub use http_connect::{
    build_connect_request, is_success_status, HttpConnectTunnel, ProxyCredentials,
    TunneledStream, MAX_RESPONSE_HEAD_BYTES,
};

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Connect to `host:port`, trying every resolved address in turn.
///
/// Each address gets the full `timeout`; the error from the last address
/// is returned when none of them accept.
pub fn connect_with_timeout(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                tracing::trace!(%addr, "TCP connection established");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "TCP connection attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{}:{} did not resolve to any address", host, port),
        )
    }))
}
