// TecoApi HTTP client
//
// Wraps `reqwest::Client` with resource URL construction, basic auth, the
// per-request deadline and the single-request gate. The device is assumed
// unable to serve concurrent requests, so every call on any clone of a
// `TecoClient` queues on the same one-permit semaphore.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::Error;
use crate::service::Service;
use crate::transport::{Deadline, TransportConfig};

/// Async client for the TecoApi object service.
///
/// Clones share the underlying connection pool and the request gate.
#[derive(Clone)]
pub struct TecoClient {
    http: reqwest::Client,
    base_url: Url,
    transport: TransportConfig,
    gate: Arc<Semaphore>,
}

impl TecoClient {
    /// Create a new client from a resource URL and a `TransportConfig`.
    ///
    /// The resource URL is the service root, e.g. `https://plc.local/TecoApi/`.
    /// A missing trailing slash is added.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, transport))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, transport: &TransportConfig) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            transport: transport.clone(),
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// The resource URL every service path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}{service}[?{path}]`.
    pub(crate) fn service_url(&self, service: Service, path: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.join(service.as_str())?;
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            url.set_query(Some(path));
        }
        Ok(url)
    }

    // ── Public operations ────────────────────────────────────────────

    /// Fetch `service`, optionally narrowed to the object at `path`.
    ///
    /// The device answers a selector with the full nesting from the top
    /// (`?A.B` yields `{"A":{"B":...}}`); the addressed sub-value is
    /// returned. Timeouts, non-200 answers and bodies that lack the
    /// requested object are logged and reported as `Ok(None)`.
    pub async fn fetch(
        &self,
        service: Service,
        path: Option<&str>,
        deadline: Deadline,
    ) -> Result<Option<Value>, Error> {
        match self.try_fetch(service, path, deadline).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_expected() => {
                warn!(
                    %service,
                    path = path.unwrap_or_default(),
                    error = %e,
                    "TecoApi GET failed"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `GetObject?{path}`.
    pub async fn get_object(&self, path: &str, deadline: Deadline) -> Result<Option<Value>, Error> {
        self.fetch(Service::GetObject, Some(path), deadline).await
    }

    /// `GetInfo`.
    pub async fn get_info(&self, deadline: Deadline) -> Result<Option<Value>, Error> {
        self.fetch(Service::GetInfo, None, deadline).await
    }

    /// `GetList`.
    pub async fn get_list(&self, deadline: Deadline) -> Result<Option<Value>, Error> {
        self.fetch(Service::GetList, None, deadline).await
    }

    /// Write `value` to the object at `path` via `PutObject`.
    ///
    /// Returns `Ok(true)` only when the device accepts with 204. Any other
    /// status, or a timeout, is logged together with the attempted body and
    /// returns `Ok(false)`.
    pub async fn write(&self, path: Option<&str>, value: Value) -> Result<bool, Error> {
        let body = put_body(path, value);
        match self.try_put(&body).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_expected() => {
                error!(
                    path = path.unwrap_or_default(),
                    body = %body,
                    error = %e,
                    "TecoApi PUT failed"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.transport.auth {
            Some(auth) => builder.basic_auth(&auth.username, Some(auth.password.expose_secret())),
            None => builder,
        }
    }

    /// Run `op` while holding the gate, bounded by `deadline`.
    ///
    /// The deadline starts once the gate is acquired, so time spent queued
    /// behind other callers does not count against it.
    async fn gated<T, F>(&self, deadline: Deadline, op: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let timeout = self.transport.timeout_for(deadline);
        let _permit = self.gate.acquire().await.map_err(|_| Error::GateClosed)?;
        trace!("request gate acquired");

        tokio::time::timeout(timeout, op)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    async fn try_fetch(
        &self,
        service: Service,
        path: Option<&str>,
        deadline: Deadline,
    ) -> Result<Value, Error> {
        let url = self.service_url(service, path)?;
        debug!("GET {}", url);

        let body = self
            .gated(deadline, async {
                let resp = self.request(Method::GET, url).send().await?;
                let status = resp.status();
                if status != StatusCode::OK {
                    return Err(Error::Status {
                        status: status.as_u16(),
                    });
                }
                resp.text().await.map_err(Error::Transport)
            })
            .await?;

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        match path.filter(|p| !p.is_empty()) {
            Some(path) => descend(value, path),
            None => Ok(value),
        }
    }

    async fn try_put(&self, body: &Value) -> Result<(), Error> {
        let url = self.service_url(Service::PutObject, None)?;
        debug!("PUT {} {}", url, body);

        self.gated(Deadline::Extended, async {
            let resp = self.request(Method::PUT, url).json(body).send().await?;
            match resp.status() {
                StatusCode::NO_CONTENT => Ok(()),
                status => Err(Error::Status {
                    status: status.as_u16(),
                }),
            }
        })
        .await
    }
}

/// Ensure the resource path ends in `/` so `Url::join` appends services.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// `{path: value}`, or the bare value when no object is addressed.
fn put_body(path: Option<&str>, value: Value) -> Value {
    match path.filter(|p| !p.is_empty()) {
        Some(path) => {
            let mut map = Map::with_capacity(1);
            map.insert(path.to_owned(), value);
            Value::Object(map)
        }
        None => value,
    }
}

/// Walk a response body down the dotted `path`.
fn descend(mut value: Value, path: &str) -> Result<Value, Error> {
    for segment in path.split('.') {
        value = match value {
            Value::Object(mut map) => map.remove(segment),
            _ => None,
        }
        .ok_or_else(|| Error::MissingSegment {
            path: path.to_owned(),
            segment: segment.to_owned(),
        })?;
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client(base: &str) -> TecoClient {
        TecoClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            &TransportConfig::default(),
        )
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("http://plc.local/TecoApi");
        assert_eq!(c.base_url().as_str(), "http://plc.local/TecoApi/");
    }

    #[test]
    fn service_url_appends_selector_as_query() {
        let c = client("http://plc.local/TecoApi/");
        let url = c.service_url(Service::GetObject, Some("ROOM.TEMP")).unwrap();
        assert_eq!(url.as_str(), "http://plc.local/TecoApi/GetObject?ROOM.TEMP");

        let url = c.service_url(Service::GetInfo, None).unwrap();
        assert_eq!(url.as_str(), "http://plc.local/TecoApi/GetInfo");
    }

    #[test]
    fn put_body_wraps_path() {
        assert_eq!(put_body(Some("A.B"), json!(true)), json!({"A.B": true}));
        assert_eq!(put_body(None, json!({"A": 1})), json!({"A": 1}));
        assert_eq!(put_body(Some(""), json!(5)), json!(5));
    }

    #[test]
    fn descend_follows_nesting() {
        let body = json!({"A": {"B": {"C": 7}}});
        assert_eq!(descend(body, "A.B").unwrap(), json!({"C": 7}));
    }

    #[test]
    fn descend_reports_missing_segment() {
        let err = descend(json!({"A": {"B": 1}}), "A.X").unwrap_err();
        assert!(matches!(err, Error::MissingSegment { ref segment, .. } if segment == "X"));
    }
}
