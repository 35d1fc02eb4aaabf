//! End-to-end tests against a local HTTP server.

use again::{RetryClient, RetryConfig, RetryError, RetryTransport};
use pretty_assertions::assert_eq;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("again=debug")
        .with_test_writer()
        .try_init();
}

fn config(max_retries: u32) -> RetryConfig {
    RetryConfig::new()
        .max_retries(max_retries)
        .fixed(Duration::from_millis(5))
}

#[tokio::test]
async fn retries_whitelisted_status_then_succeeds() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RetryClient::with_config(config(2).whitelist([429, 503]));
    let request = client
        .request(Method::POST, format!("{}/api", server.uri()))
        .body("hello");

    let response = assert_ok!(client.execute(request).await);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "created");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
    for request in received {
        assert_eq!(request.body, b"hello".to_vec());
    }
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let client = RetryClient::with_config(config(3));
    let err = assert_err!(client.get(format!("{}/flaky", server.uri())).await);

    assert!(matches!(err, RetryError::Exhausted { attempts: 4, .. }));
    assert_eq!(
        err.to_string(),
        "final error: Service Unavailable after 4 attempts"
    );
}

#[tokio::test]
async fn non_whitelisted_status_is_not_retried() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = RetryClient::with_config(config(1).whitelist([503]));
    let err = assert_err!(client.get(server.uri()).await);

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.to_string(), "non-retryable error: Internal Server Error");
}

#[tokio::test]
async fn json_body_is_replayed() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = RetryClient::with_config(config(2));
    let body = serde_json::json!({ "name": "again", "tags": ["http", "retry"] });
    let response = assert_ok!(client.put_json(format!("{}/items/1", server.uri()), &body).await);
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    for request in received {
        let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(sent, body);
    }
}

#[tokio::test]
async fn connection_error_is_not_retried() {
    init_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = RetryTransport::new(Client::new(), config(3));
    let request = Client::new()
        .get(format!("http://{addr}/"))
        .build()
        .unwrap();

    let err = assert_err!(transport.send(request).await);
    assert!(matches!(err, RetryError::Transport(_)));
    assert!(err.to_string().starts_with("non-retryable error"));
}

#[tokio::test]
async fn request_timeout_is_not_retried() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RetryTransport::new(Client::new(), config(3));
    let request = Client::new()
        .get(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = assert_err!(transport.send(request).await);
    assert!(matches!(err, RetryError::Transport(_)));
}
