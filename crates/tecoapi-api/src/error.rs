use thiserror::Error;

/// Top-level error type for the `tecoapi-api` crate.
///
/// Only [`Transport`](Self::Transport) and [`Deserialization`](Self::Deserialization)
/// ever escape the public [`TecoClient`](crate::TecoClient) calls. Timeouts,
/// status failures and missing segments are logged and folded into a
/// `None` / `false` result at the client boundary.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request did not complete before its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The request gate was closed while a caller waited on it.
    #[error("Request gate closed")]
    GateClosed,

    /// A configured header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// The device answered with an unexpected status code.
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    /// The response body did not contain the requested object.
    #[error("Object {path} has no member {segment:?}")]
    MissingSegment { path: String, segment: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` for failures the client reports as a sentinel value
    /// instead of propagating.
    pub(crate) fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Status { .. } | Self::MissingSegment { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_server_errors_are_transient() {
        assert!(Error::Timeout { timeout_ms: 300 }.is_transient());
        assert!(Error::Status { status: 503 }.is_transient());
        assert!(!Error::Status { status: 404 }.is_transient());
    }

    #[test]
    fn expected_failures_exclude_decode_errors() {
        assert!(Error::Status { status: 500 }.is_expected());
        assert!(
            Error::MissingSegment {
                path: "A.B".into(),
                segment: "B".into()
            }
            .is_expected()
        );
        assert!(
            !Error::Deserialization {
                message: "eof".into(),
                body: String::new()
            }
            .is_expected()
        );
    }
}
