//! HTTP CONNECT tunnel errors.

use thiserror::Error;

/// Failure to open a CONNECT tunnel through an HTTP proxy.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// TCP connection to the proxy could not be established.
    #[error("failed to connect to HTTP proxy {proxy}: {source}")]
    Connect {
        proxy: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the request or reading the response failed.
    #[error("HTTP proxy I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The proxy closed the connection before the response head was complete.
    #[error("HTTP proxy closed the connection before the response headers ended ({received} bytes received)")]
    Truncated { received: usize },

    /// The response head grew past the cap without a terminator.
    #[error("HTTP proxy response headers exceed {limit} bytes")]
    HeaderTooLarge { limit: usize },

    /// The proxy answered with a non-200 status.
    #[error("HTTP proxy refused the tunnel: {status_line}")]
    Rejected { status_line: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_carries_status_line() {
        let err = TunnelError::Rejected {
            status_line: "HTTP/1.1 407 Proxy Authentication Required".to_string(),
        };
        assert!(err.to_string().contains("407 Proxy Authentication Required"));
    }

    #[test]
    fn test_header_too_large_display() {
        let err = TunnelError::HeaderTooLarge { limit: 65536 };
        assert_eq!(
            err.to_string(),
            "HTTP proxy response headers exceed 65536 bytes"
        );
    }
}
