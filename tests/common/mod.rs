//! Common test utilities for integration tests.
//!
//! - [`FakeProxy`] - One-shot HTTP proxy that answers CONNECT with canned bytes
//! - [`fixed_time`] - Deterministic clock start
//! - [`write_trigger`] - Create a trigger file with a chosen age

#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeZone, Utc};

/// A proxy that accepts one connection, captures the request head and
/// replies with `response` verbatim.
pub struct FakeProxy {
    pub port: u16,
    handle: JoinHandle<String>,
}

impl FakeProxy {
    pub fn start(response: impl Into<Vec<u8>>) -> Self {
        let response = response.into();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            // The client hangs up early on oversized replies.
            let _ = socket.write_all(&response).and_then(|_| socket.flush());
            // Hold the socket open long enough for the client to read.
            std::thread::sleep(Duration::from_millis(200));
            String::from_utf8_lossy(&request).into_owned()
        });

        Self { port, handle }
    }

    /// Wait for the proxy thread and return the request it received.
    pub fn request(self) -> String {
        self.handle.join().unwrap()
    }
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

/// Create `dir/name` and set its mtime `age` in the past.
pub fn write_trigger(dir: &Path, name: &str, age: Duration) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
    path
}

/// Environment lookup backed by a fixed list of pairs.
pub fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
