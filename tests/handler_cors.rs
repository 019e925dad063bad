mod common;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum_test::TestServer;
use serde_json::json;
use tinyurl::routes::router;

fn preflight_headers() -> [(header::HeaderName, HeaderValue); 3] {
    [
        (
            header::ORIGIN,
            HeaderValue::from_static("https://app.example.com"),
        ),
        (
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        ),
        (
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("content-type"),
        ),
    ]
}

#[tokio::test]
async fn test_preflight_allows_any_origin_by_default() {
    let (state, _backends) = common::create_test_state();
    let server = TestServer::new(router(state, &[])).unwrap();

    let mut request = server.method(Method::OPTIONS, "/api/v1/shorten");
    for (name, value) in preflight_headers() {
        request = request.add_header(name, value);
    }
    let response = request.await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"), "allowed methods were {methods}");
}

#[tokio::test]
async fn test_preflight_echoes_configured_origin() {
    let (state, _backends) = common::create_test_state();
    let origins = vec!["https://app.example.com".to_string()];
    let server = TestServer::new(router(state, &origins)).unwrap();

    let mut request = server.method(Method::OPTIONS, "/api/v1/shorten");
    for (name, value) in preflight_headers() {
        request = request.add_header(name, value);
    }
    let response = request.await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
}

#[tokio::test]
async fn test_unlisted_origin_gets_no_cors_header() {
    let (state, _backends) = common::create_test_state();
    let origins = vec!["https://app.example.com".to_string()];
    let server = TestServer::new(router(state, &origins)).unwrap();

    let response = server
        .post("/api/v1/shorten")
        .add_header(
            header::ORIGIN,
            HeaderValue::from_static("https://evil.example.com"),
        )
        .json(&json!({ "long_url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_simple_request_carries_cors_header() {
    let (state, _backends) = common::create_test_state();
    let server = TestServer::new(router(state, &[])).unwrap();

    let response = server
        .post("/api/v1/shorten")
        .add_header(
            header::ORIGIN,
            HeaderValue::from_static("https://app.example.com"),
        )
        .json(&json!({ "long_url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
