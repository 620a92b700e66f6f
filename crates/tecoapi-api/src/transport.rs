// Shared transport configuration for building reqwest::Client instances.
//
// Carries TLS mode, credentials, extra headers and the two request
// deadlines. The client applies deadlines itself, per request, so the
// reqwest builder is never given a global timeout.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;

use crate::error::Error;

/// Default deadline for steady-state polling.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(300);

/// Default deadline for setup, discovery and one-shot service calls.
pub const DEFAULT_EXTENDED_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (for self-signed PLC web servers).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the `verify_ssl` configuration flag onto a mode.
    pub fn from_verify(verify_ssl: bool) -> Self {
        if verify_ssl {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// HTTP basic credentials sent with every request.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Which deadline a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Short deadline used by scheduled refreshes.
    Poll,
    /// Long deadline used while building trees and for ad-hoc service calls.
    Extended,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub auth: Option<BasicAuth>,
    pub headers: HashMap<String, String>,
    pub poll_timeout: Duration,
    pub extended_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            auth: None,
            headers: HashMap::new(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            extended_timeout: DEFAULT_EXTENDED_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// The duration a request under `deadline` may take.
    pub fn timeout_for(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Poll => self.poll_timeout,
            Deadline::Extended => self.extended_timeout,
        }
    }

    /// Build a `reqwest::Client` with the configured headers and TLS mode.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("tecoapi/", env!("CARGO_PKG_VERSION")))
            .default_headers(self.header_map()?);

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    fn header_map(&self) -> Result<HeaderMap, Error> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}
