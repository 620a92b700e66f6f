// ── Core error types ──
//
// User-facing errors from tecoapi-core. The `From<tecoapi_api::Error>`
// impl translates transport-layer errors into domain variants so hosts
// never match on reqwest types.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lifecycle ────────────────────────────────────────────────────
    /// A platform was set up before the hub connected. Hosts should retry
    /// the platform setup later.
    #[error("TecoApi hub is not ready")]
    NotReady,

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach TecoApi at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("TecoApi request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected data for {path}: {message}")]
    Protocol { path: String, message: String },

    #[error("Entity not found: {identifier}")]
    NotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{entity} is read-only")]
    ReadOnly { entity: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tecoapi_api::Error> for CoreError {
    fn from(err: tecoapi_api::Error) -> Self {
        match err {
            tecoapi_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            tecoapi_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tecoapi_api::Error::InvalidHeader(msg) => CoreError::Config {
                message: format!("Invalid header: {msg}"),
            },
            tecoapi_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tecoapi_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            tecoapi_api::Error::GateClosed => CoreError::Api {
                message: "request gate closed".into(),
                status: None,
            },
            tecoapi_api::Error::Status { status } => CoreError::Api {
                message: format!("HTTP {status}"),
                status: Some(status),
            },
            tecoapi_api::Error::MissingSegment { path, segment } => CoreError::Protocol {
                path,
                message: format!("no member {segment:?}"),
            },
            tecoapi_api::Error::Deserialization { message, body: _ } => CoreError::Protocol {
                path: String::new(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_segment_maps_to_protocol() {
        let err = CoreError::from(tecoapi_api::Error::MissingSegment {
            path: "A.B".into(),
            segment: "B".into(),
        });
        assert!(matches!(err, CoreError::Protocol { ref path, .. } if path == "A.B"));
    }

    #[test]
    fn status_keeps_code() {
        let err = CoreError::from(tecoapi_api::Error::Status { status: 500 });
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    }
}
