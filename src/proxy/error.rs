//! Upstream failure classification.
//!
//! Raw transport errors stay inside [`UpstreamError`] for logging; clients
//! only ever see the translated message from `http::response`.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Coarse category of a forwarding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Timeout,
    ConnectionRefused,
    DnsFailure,
    Tls,
    /// Connection could not be established for another reason.
    Connect,
    Protocol,
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection refused",
            Self::DnsFailure => "dns failure",
            Self::Tls => "tls failure",
            Self::Connect => "connect failure",
            Self::Protocol => "protocol error",
        };
        f.write_str(s)
    }
}

/// A failed upstream call.
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct UpstreamError {
    kind: UpstreamErrorKind,
    #[source]
    source: BoxError,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// No response headers arrived within `after`.
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            UpstreamErrorKind::Timeout,
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no response within {}ms", after.as_millis()),
            ),
        )
    }

    /// The response body stalled or overran the call deadline.
    pub fn body_timeout(reason: &str) -> Self {
        Self::new(
            UpstreamErrorKind::Timeout,
            io::Error::new(io::ErrorKind::TimedOut, format!("response body {}", reason)),
        )
    }

    pub fn kind(&self) -> UpstreamErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            UpstreamErrorKind::Timeout
        } else if let Some(kind) = classify_chain(&err) {
            kind
        } else if err.is_connect() {
            UpstreamErrorKind::Connect
        } else {
            UpstreamErrorKind::Protocol
        };
        Self::new(kind, err)
    }
}

impl From<hyper_util::client::legacy::Error> for UpstreamError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        let kind = if let Some(kind) = classify_chain(&err) {
            kind
        } else if err.is_connect() {
            UpstreamErrorKind::Connect
        } else {
            UpstreamErrorKind::Protocol
        };
        Self::new(kind, err)
    }
}

/// Walk an error's source chain looking for a recognizable transport cause.
pub(crate) fn classify_chain(err: &(dyn StdError + 'static)) -> Option<UpstreamErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some(UpstreamErrorKind::ConnectionRefused),
                io::ErrorKind::TimedOut => return Some(UpstreamErrorKind::Timeout),
                _ => {}
            }
        }

        let message = e.to_string().to_ascii_lowercase();
        if message.starts_with("dns error") || message.contains("failed to lookup address") {
            return Some(UpstreamErrorKind::DnsFailure);
        }
        if message.contains("certificate") || message.contains("tls") || message.contains("handshake") {
            return Some(UpstreamErrorKind::Tls);
        }

        current = e.source();
    }
    None
}
