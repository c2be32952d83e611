//! Integration tests for HttpResolver using wiremock.

use accio::{CacheScope, ConfigRegistry, Descriptor, Method, RequestController, Resolver};
use accio_reqwest::{HttpResolver, ResolveError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_parses_json_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch/foo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foo": "bar" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = HttpResolver::new().base_url(mock_server.uri());
    let descriptor = Descriptor::new("/fetch/foo");
    let response = resolver
        .resolve(&descriptor.endpoint, &descriptor.options, &descriptor.context)
        .await
        .unwrap();

    assert_eq!(response, json!({ "foo": "bar" }));
}

#[tokio::test]
async fn post_sends_json_body_and_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("content-type", "application/json"))
        .and(header("x-tenant", "acme"))
        .and(body_json(json!({ "q": "rust" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = HttpResolver::new().base_url(mock_server.uri());
    let descriptor = Descriptor::new("/search")
        .method(Method::Post)
        .header("x-tenant", "acme")
        .body(json!({ "q": "rust" }));
    let response = resolver
        .resolve(&descriptor.endpoint, &descriptor.options, &descriptor.context)
        .await
        .unwrap();

    assert_eq!(response, json!([1, 2, 3]));
}

#[tokio::test]
async fn non_success_status_is_a_status_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let resolver = HttpResolver::new().base_url(mock_server.uri());
    let descriptor = Descriptor::new("/missing");
    let err = resolver
        .resolve(&descriptor.endpoint, &descriptor.options, &descriptor.context)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Status { status: 404 }));
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let resolver = HttpResolver::new().base_url(mock_server.uri());
    let descriptor = Descriptor::new("/text");
    let err = resolver
        .resolve(&descriptor.endpoint, &descriptor.options, &descriptor.context)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Parse(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Nothing listens on port 1.
    let resolver = HttpResolver::new().base_url("http://127.0.0.1:1");
    let descriptor = Descriptor::new("/gone");
    let err = resolver
        .resolve(&descriptor.endpoint, &descriptor.options, &descriptor.context)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Transport(_)));
}

#[tokio::test]
async fn controllers_in_one_scope_send_one_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = ConfigRegistry::new(accio_reqwest::defaults());
    let scope = CacheScope::new();
    let url = format!("{}/users/1", mock_server.uri());
    let build = || {
        RequestController::builder(Descriptor::new(&url), registry.clone())
            .scope(&scope)
            .build()
    };

    let first = build();
    let second = build();
    tokio::join!(first.activate(), second.activate());

    assert_eq!(first.state().response, Some(json!({ "id": 1 })));
    assert_eq!(second.state().response, Some(json!({ "id": 1 })));
}
