//! Integration tests for ReqwestTransport against a mock HTTP server.

use courier_core::endpoints::get_weather;
use courier_core::{
    CancellationToken, CourierError, HttpOrchestrator, MemoryTokenStore, ReqwestTransport,
    Transport, TransportRequest,
};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn transport_for(server: &MockServer) -> ReqwestTransport {
    ReqwestTransport::new()
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn test_exchange_sends_query_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(query_param("dry_run", "true"))
        .and(header("token", "abc"))
        .and(body_json(json!({"sku": "A-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let mut request = TransportRequest::new(Method::POST, "/api/orders");
    request.query.insert("dry_run".into(), "true".into());
    request.headers.push(("token".into(), "abc".into()));
    request.body = Some(json!({"sku": "A-1"}));

    let response = transport
        .send(request, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({"code": 200}));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(path("/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let response = transport_for(&server)
        .await
        .send(
            TransportRequest::new(Method::GET, "/broken"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.body, json!("maintenance"));
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut request = TransportRequest::new(Method::GET, "/slow");
    request.timeout = Duration::from_millis(100);

    let err = transport_for(&server)
        .await
        .send(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CourierError::Timeout(Some(d)) if d == Duration::from_millis(100)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_reqwest_timeout_conversion_does_not_invent_a_limit() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = reqwest::Client::new()
        .get(format!("{}/slow", server.uri()))
        .timeout(Duration::from_millis(50))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let converted = CourierError::from(err);
    assert!(matches!(converted, CourierError::Timeout(None)));
    assert!(converted.is_retryable());
}

#[tokio::test]
async fn test_abort_signal_stops_in_flight_exchange() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = transport
        .send(TransportRequest::new(Method::GET, "/slow"), token)
        .await
        .unwrap_err();
    assert!(matches!(err, CourierError::Cancelled));
}

#[tokio::test]
async fn test_get_weather_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather"))
        .and(query_param("city", "Hangzhou"))
        .and(header("token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "msg": "ok",
            "data": {"temp": 21}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = HttpOrchestrator::builder(Arc::new(transport_for(&server).await))
        .token_store(Arc::new(MemoryTokenStore::with_token("secret")))
        .build();

    let payload = get_weather(&orchestrator, [("city", "Hangzhou")])
        .await
        .unwrap();
    assert_eq!(payload["data"]["temp"], 21);
}

#[tokio::test]
async fn test_server_error_is_retried_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let orchestrator = HttpOrchestrator::builder(Arc::new(transport_for(&server).await)).build();

    let err = orchestrator
        .send(
            courier_core::ApiRequest::get("/api/flaky")
                .retry(1)
                .retry_delay(Duration::from_millis(10)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}
