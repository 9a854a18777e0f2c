//! HTTP CONNECT tunnel against a fake proxy.

mod common;

use std::io::Read;
use std::time::Duration;

use common::FakeProxy;
use trigger_watcher::error::TunnelError;
use trigger_watcher::tunnel::{HttpConnectTunnel, ProxyCredentials};

fn tunnel(port: u16) -> HttpConnectTunnel {
    HttpConnectTunnel::new("127.0.0.1", port, Duration::from_secs(2))
        .with_io_timeout(Duration::from_secs(2))
}

#[test]
fn test_proxy_auth_required_is_rejected() {
    let proxy = FakeProxy::start(
        b"HTTP/1.1 407 Proxy Authentication Required\r\nProxy-Authenticate: Basic\r\n\r\n",
    );
    let err = tunnel(proxy.port).establish("sftp.example.com", 22).unwrap_err();

    match err {
        TunnelError::Rejected { status_line } => {
            assert_eq!(status_line, "HTTP/1.1 407 Proxy Authentication Required")
        }
        other => panic!("unexpected error {:?}", other),
    }
    let request = proxy.request();
    assert!(request.starts_with("CONNECT sftp.example.com:22 HTTP/1.1\r\n"));
    assert!(!request.contains("Proxy-Authorization"));
}

#[test]
fn test_established_tunnel_keeps_server_banner() {
    let proxy = FakeProxy::start(
        b"HTTP/1.1 200 Connection established\r\n\r\nSSH-2.0-OpenSSH_9.6\r\n",
    );
    let mut stream = tunnel(proxy.port).establish("sftp.example.com", 22).unwrap();

    let mut banner = [0u8; 21];
    stream.read_exact(&mut banner).unwrap();
    assert_eq!(&banner, b"SSH-2.0-OpenSSH_9.6\r\n");
    proxy.request();
}

#[test]
fn test_status_code_at_end_of_line() {
    let proxy = FakeProxy::start(b"HTTP/1.0 200\r\n\r\n");
    assert!(tunnel(proxy.port).establish("host", 2222).is_ok());
    assert!(proxy.request().starts_with("CONNECT host:2222 HTTP/1.1\r\n"));
}

#[test]
fn test_basic_auth_header_is_sent() {
    let proxy = FakeProxy::start(b"HTTP/1.1 200 OK\r\n\r\n");
    let credentials = ProxyCredentials {
        username: "user".to_string(),
        password: "pass".to_string(),
    };
    tunnel(proxy.port)
        .with_credentials(Some(credentials))
        .establish("sftp.example.com", 22)
        .unwrap();

    let request = proxy.request();
    assert!(request.contains("Proxy-Authorization: Basic dXNlcjpwYXNz\r\n"));
    assert!(request.contains("Host: sftp.example.com:22\r\n"));
}

#[test]
fn test_truncated_response() {
    // The fake proxy closes after its pause, so the head never completes.
    let proxy = FakeProxy::start(b"HTTP/1.1 200 Connection est");
    let err = tunnel(proxy.port).establish("host", 22).unwrap_err();
    assert!(matches!(err, TunnelError::Truncated { received: 27 }));
    proxy.request();
}

#[test]
fn test_oversized_response_head() {
    let mut response = b"HTTP/1.1 200 OK\r\n".to_vec();
    response.resize(70 * 1024, b'x');
    let proxy = FakeProxy::start(response);

    let err = tunnel(proxy.port).establish("sftp.example.com", 22).unwrap_err();
    assert!(matches!(err, TunnelError::HeaderTooLarge { limit: 65536 }));
    proxy.request();
}

#[test]
fn test_unreachable_proxy() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = tunnel(port).establish("host", 22).unwrap_err();
    assert!(matches!(err, TunnelError::Connect { .. }));
}
