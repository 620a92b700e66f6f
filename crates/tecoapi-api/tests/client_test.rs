#![allow(clippy::unwrap_used)]
// Integration tests for `TecoClient` using wiremock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use tecoapi_api::{BasicAuth, Deadline, Error, Service, TecoClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn transport() -> TransportConfig {
    TransportConfig {
        poll_timeout: Duration::from_millis(100),
        extended_timeout: Duration::from_secs(2),
        ..TransportConfig::default()
    }
}

async fn setup_with(transport: &TransportConfig) -> (MockServer, TecoClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/TecoApi", server.uri())).unwrap();
    let client = TecoClient::new(base_url, transport).unwrap();
    (server, client)
}

async fn setup() -> (MockServer, TecoClient) {
    setup_with(&transport()).await
}

/// Match the raw query string (`?A.B` carries no `key=value` pairs).
fn selector(expected: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |req: &Request| req.url.query() == Some(expected)
}

// ── GET ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_object_descends_into_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .and(selector("A.B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"A": {"B": {"C": 1}}})))
        .mount(&server)
        .await;

    let value = client.get_object("A.B", Deadline::Extended).await.unwrap();
    assert_eq!(value, Some(json!({"C": 1})));
}

#[tokio::test]
async fn test_get_info_returns_whole_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetInfo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Model": "TC700", "Version": "4.2"})),
        )
        .mount(&server)
        .await;

    let value = client.get_info(Deadline::Extended).await.unwrap();
    assert_eq!(value, Some(json!({"Model": "TC700", "Version": "4.2"})));
}

#[tokio::test]
async fn test_get_non_200_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let value = client.get_object("MISSING", Deadline::Poll).await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_get_missing_segment_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"OTHER": 1})))
        .mount(&server)
        .await;

    let value = client.get_object("A", Deadline::Poll).await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_get_timeout_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"A": 1}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let value = client.get_object("A", Deadline::Poll).await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_extended_deadline_outlasts_slow_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"A": 1}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let value = client.get_object("A", Deadline::Extended).await.unwrap();
    assert_eq!(value, Some(json!(1)));
}

#[tokio::test]
async fn test_malformed_body_propagates() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result = client.get_object("A", Deadline::Poll).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_propagates() {
    let base_url = Url::parse("http://127.0.0.1:9/TecoApi/").unwrap();
    let client = TecoClient::new(base_url, &transport()).unwrap();

    let result = client.fetch(Service::GetList, None, Deadline::Extended).await;
    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected Transport error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_credentials_and_headers_are_sent() {
    let mut headers = HashMap::new();
    headers.insert("X-Teco-Client".to_string(), "tests".to_string());
    let transport = TransportConfig {
        auth: Some(BasicAuth {
            username: "admin".into(),
            password: "secret".to_string().into(),
        }),
        headers,
        ..transport()
    };
    let (server, client) = setup_with(&transport).await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetList"))
        .and(basic_auth("admin", "secret"))
        .and(header("X-Teco-Client", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["A", "B"])))
        .expect(1)
        .mount(&server)
        .await;

    let value = client.get_list(Deadline::Extended).await.unwrap();
    assert_eq!(value, Some(json!(["A", "B"])));
}

// ── PUT ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_accepted_on_204() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/TecoApi/PutObject"))
        .and(body_json(json!({"A.B": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.write(Some("A.B"), json!(true)).await.unwrap());
}

#[tokio::test]
async fn test_write_rejected_on_200() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/TecoApi/PutObject"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(!client.write(Some("A.B"), json!(false)).await.unwrap());
}

#[tokio::test]
async fn test_write_without_path_sends_bare_value() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/TecoApi/PutObject"))
        .and(body_json(json!({"ROOM": {"SETPOINT": 21.5}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let written = client
        .write(None, json!({"ROOM": {"SETPOINT": 21.5}}))
        .await
        .unwrap();
    assert!(written);
}

#[tokio::test]
async fn test_write_with_empty_path_sends_bare_value() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/TecoApi/PutObject"))
        .and(body_json(json!(5)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.write(Some(""), json!(5)).await.unwrap());
}

// ── Gate ────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_requests_are_serialized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/TecoApi/GetObject"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"A": 1, "B": 2}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let other = client.clone();
    let started = Instant::now();
    let (a, b) = tokio::join!(
        client.get_object("A", Deadline::Extended),
        other.get_object("B", Deadline::Extended),
    );

    assert_eq!(a.unwrap(), Some(json!(1)));
    assert_eq!(b.unwrap(), Some(json!(2)));
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "requests overlapped: {:?}",
        started.elapsed()
    );
}
