// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP integration tests for the gateway.
//!
//! These tests use `axum-test` to drive the full router with all middleware
//! applied, and `mockito` servers standing in for auth APIs and upstreams.
//! Requests whose target must reach the server unnormalized are written to a
//! real socket instead.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth_gateway::application::{AppState, create_router};
use auth_gateway::clock::ManualClock;
use auth_gateway::configuration::GatewayOptions;
use auth_gateway::constants::ACCESS_DENIED_MESSAGE;
use auth_gateway::models::{AllowedPath, AuthMode, Endpoint, GatewayConfig};
use auth_gateway::store::CredentialStore;
use auth_gateway::token_cache::TokenCache;
use axum::Router;
use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use gateway_cipher::{MasterKey, encrypt};
use mockito::{Matcher, Server, ServerGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TEST_KEY: &str = "12345678901234567890123456789012";

fn test_key() -> MasterKey {
    MasterKey::try_from(TEST_KEY).unwrap()
}

/// An endpoint allowing `GET /data` and `POST /submit`.
fn endpoint(name: &str, mode: AuthMode, target: &ServerGuard, auth: Option<&ServerGuard>) -> Endpoint {
    Endpoint {
        name: name.to_string(),
        target_url: target.url(),
        auth_mode: mode,
        auth_api: auth.map(|server| format!("{}/token", server.url())),
        username: auth.map(|_| "svcuser".to_string()),
        encrypted_password: auth.map(|_| encrypt(&test_key(), "s3cret").unwrap()),
        allowlist: vec![
            AllowedPath::new("/data", &["GET"]),
            AllowedPath::new("/submit", &["POST"]),
        ],
    }
}

/// Builds the production router for the given endpoints, with a manual clock.
fn create_test_router(endpoints: Vec<Endpoint>, options: GatewayOptions) -> (Router, ManualClock) {
    let clock = ManualClock::new();
    let client = TokenCache::build_client(Duration::from_secs(5)).unwrap();
    let tokens = Arc::new(TokenCache::with_clock(
        test_key(),
        client,
        Arc::new(clock.clone()),
    ));
    let store = CredentialStore::from_config(GatewayConfig { endpoints }).unwrap();
    let state = AppState::with_token_cache(options, Arc::new(store), tokens).unwrap();

    (create_router(Arc::new(state)), clock)
}

/// Creates a test server for the given endpoints, with a manual clock.
fn create_test_server(endpoints: Vec<Endpoint>, options: GatewayOptions) -> (TestServer, ManualClock) {
    let (router, clock) = create_test_router(endpoints, options);
    (TestServer::new(router).unwrap(), clock)
}

/// Serves `router` on an ephemeral local port.
async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    address
}

/// Writes a request line verbatim and returns the raw response.
async fn send_raw(address: SocketAddr, method: &str, target: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    let request =
        format!("{method} {target} HTTP/1.1\r\nHost: {address}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn token_mock(auth: &mut ServerGuard, body: &str, expect: usize) -> mockito::Mock {
    auth.mock("POST", "/token")
        .match_body(Matcher::Json(serde_json::json!({
            "username": "svcuser",
            "password": "s3cret"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(expect)
        .create_async()
        .await
}

// =============================================================================
// Operational Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_status_ok() {
    let (server, _clock) = create_test_server(vec![], GatewayOptions::default());
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_endpoints_listing_hides_credentials() {
    let upstream = Server::new_async().await;
    let auth = Server::new_async().await;
    let (server, _clock) = create_test_server(
        vec![
            endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth)),
            endpoint("open", AuthMode::None, &upstream, None),
        ],
        GatewayOptions::default(),
    );

    let response = server.get("/endpoints").await;
    response.assert_status_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json[0]["name"], "svc1");
    assert_eq!(json[0]["auth_type"], "bearer");
    assert_eq!(json[0]["allowed"][0]["path"], "/data");
    assert_eq!(json[1]["name"], "open");
    assert_eq!(json[1]["auth_type"], "none");

    let text = response.text();
    assert!(!text.contains("svcuser"));
    assert!(!text.contains("password_enc"));
    assert!(!text.contains("/token"));
}

// =============================================================================
// Authenticated Proxying
// =============================================================================

#[tokio::test]
async fn test_bearer_token_is_cached_until_sixty_seconds_before_expiry() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let token = token_mock(&mut auth, r#"{"token":"abc123","expires_in":120}"#, 2).await;
    let data = upstream
        .mock("GET", "/data")
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .with_body("payload")
        .expect(3)
        .create_async()
        .await;

    let (server, clock) = create_test_server(
        vec![endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth))],
        GatewayOptions::default(),
    );

    let response = server.get("/api/svc1/data").await;
    response.assert_status_ok();
    response.assert_text("payload");

    clock.advance(Duration::from_secs(59));
    server.get("/api/svc1/data").await.assert_status_ok();

    clock.advance(Duration::from_secs(2));
    server.get("/api/svc1/data").await.assert_status_ok();

    token.assert_async().await;
    data.assert_async().await;
}

#[tokio::test]
async fn test_token_mode_uses_token_scheme() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let _token = token_mock(&mut auth, r#"{"access_token":"xyz"}"#, 1).await;
    let data = upstream
        .mock("GET", "/data")
        .match_header("authorization", "Token xyz")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("svc2", AuthMode::Token, &upstream, Some(&auth))],
        GatewayOptions::default(),
    );

    server.get("/api/svc2/data").await.assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_client_authorization_is_replaced() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let _token = token_mock(&mut auth, r#"{"token":"abc123"}"#, 1).await;
    let data = upstream
        .mock("GET", "/data")
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth))],
        GatewayOptions::default(),
    );

    server
        .get("/api/svc1/data")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer forged"))
        .await
        .assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_none_mode_adds_no_authorization() {
    let mut upstream = Server::new_async().await;
    let data = upstream
        .mock("GET", "/data")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    server.get("/api/open/data").await.assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_none_mode_passes_client_authorization_through() {
    let mut upstream = Server::new_async().await;
    let data = upstream
        .mock("GET", "/data")
        .match_header("authorization", "Bearer client")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    server
        .get("/api/open/data")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer client"))
        .await
        .assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_query_and_subpath_are_forwarded() {
    let mut upstream = Server::new_async().await;
    let data = upstream
        .mock("GET", "/data/items/7")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    server
        .get("/api/open/data/items/7")
        .add_query_param("page", 2)
        .await
        .assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_upstream_status_headers_and_body_are_relayed() {
    let mut upstream = Server::new_async().await;
    let submit = upstream
        .mock("POST", "/submit")
        .match_body(r#"{"id":1}"#)
        .with_status(201)
        .with_header("x-upstream", "yes")
        .with_body("created")
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    let response = server
        .post("/api/open/submit")
        .bytes(Bytes::from_static(br#"{"id":1}"#))
        .await;

    response.assert_status(StatusCode::CREATED);
    response.assert_header(HeaderName::from_static("x-upstream"), "yes");
    response.assert_text("created");
    submit.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed_unchanged() {
    let mut upstream = Server::new_async().await;
    let _data = upstream
        .mock("GET", "/data")
        .with_status(404)
        .with_body("no such thing")
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    let response = server.get("/api/open/data").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_text("no such thing");
}

// =============================================================================
// Access Control
// =============================================================================

#[tokio::test]
async fn test_disallowed_method_is_denied_before_auth() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let token = token_mock(&mut auth, r#"{"token":"abc123"}"#, 0).await;
    let data = upstream
        .mock("POST", "/data")
        .expect(0)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth))],
        GatewayOptions::default(),
    );

    let response = server.post("/api/svc1/data").await;
    response.assert_status(StatusCode::FORBIDDEN);
    response.assert_text(ACCESS_DENIED_MESSAGE);

    token.assert_async().await;
    data.assert_async().await;
}

#[tokio::test]
async fn test_path_outside_allowlist_is_denied() {
    let upstream = Server::new_async().await;
    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    for path in ["/api/open/admin", "/api/open/", "/api/open"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_text(ACCESS_DENIED_MESSAGE);
    }
}

#[tokio::test]
async fn test_allowlist_prefix_is_literal() {
    let mut upstream = Server::new_async().await;
    let data = upstream
        .mock("GET", "/datastore")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("open", AuthMode::None, &upstream, None)],
        GatewayOptions::default(),
    );

    server.get("/api/open/datastore").await.assert_status_ok();
    data.assert_async().await;
}

#[tokio::test]
async fn test_dot_segments_cannot_escape_the_allowlist() {
    let mut upstream = Server::new_async().await;
    let admin = upstream
        .mock("DELETE", "/admin/users")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;
    let items = upstream
        .mock("DELETE", "/data/items")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let mut open = endpoint("open", AuthMode::None, &upstream, None);
    open.allowlist = vec![AllowedPath::new("/data", &["GET", "DELETE"])];
    let (router, _clock) = create_test_router(vec![open], GatewayOptions::default());
    let address = serve(router).await;

    for target in [
        "/api/open/data/../admin/users",
        "/api/open/data/%2e%2e/admin/users",
        "/api/open/data/%2E%2E/admin/users",
        "/api/open/data/./../admin/users",
    ] {
        let response = send_raw(address, "DELETE", target).await;
        assert!(response.starts_with("HTTP/1.1 403"), "{target}: {response}");
        assert!(response.contains(ACCESS_DENIED_MESSAGE), "{target}: {response}");
    }

    let response = send_raw(address, "DELETE", "/api/open/data/items").await;
    assert!(response.starts_with("HTTP/1.1 204"), "{response}");

    admin.assert_async().await;
    items.assert_async().await;
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let (server, _clock) = create_test_server(vec![], GatewayOptions::default());
    let response = server.get("/api/nope/data").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&serde_json::json!({"code": 404, "message": "Endpoint not found"}));
}

// =============================================================================
// Fail Closed
// =============================================================================

#[tokio::test]
async fn test_auth_failure_never_reaches_upstream() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let _token = auth
        .mock("POST", "/token")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let data = upstream
        .mock("GET", "/data")
        .expect(0)
        .create_async()
        .await;

    let (server, _clock) = create_test_server(
        vec![endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth))],
        GatewayOptions::default(),
    );

    let response = server.get("/api/svc1/data").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], 502);
    assert!(!response.text().contains("boom"));

    data.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_auth_api_never_reaches_upstream() {
    let mut upstream = Server::new_async().await;
    let auth = Server::new_async().await;
    let data = upstream
        .mock("GET", "/data")
        .expect(0)
        .create_async()
        .await;

    let mut svc = endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth));
    svc.auth_api = Some("http://127.0.0.1:9/token".to_string());

    let (server, _clock) = create_test_server(vec![svc], GatewayOptions::default());

    let response = server.get("/api/svc1/data").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    response.assert_json(&serde_json::json!({"code": 503, "message": "Auth API unavailable"}));

    data.assert_async().await;
}

#[tokio::test]
async fn test_undecryptable_password_fails_with_500() {
    let mut upstream = Server::new_async().await;
    let mut auth = Server::new_async().await;
    let token = token_mock(&mut auth, r#"{"token":"abc123"}"#, 0).await;
    let data = upstream
        .mock("GET", "/data")
        .expect(0)
        .create_async()
        .await;

    let mut svc = endpoint("svc1", AuthMode::Bearer, &upstream, Some(&auth));
    let other_key = MasterKey::try_from("abcdefghijklmnopqrstuvwxyz012345").unwrap();
    svc.encrypted_password = Some(encrypt(&other_key, "s3cret").unwrap());

    let (server, _clock) = create_test_server(vec![svc], GatewayOptions::default());

    let response = server.get("/api/svc1/data").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    token.assert_async().await;
    data.assert_async().await;
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut upstream = Server::new_async().await;
    let submit = upstream
        .mock("POST", "/submit")
        .expect(0)
        .create_async()
        .await;

    let options = GatewayOptions {
        max_body_bytes: 16,
        ..GatewayOptions::default()
    };
    let (server, _clock) =
        create_test_server(vec![endpoint("open", AuthMode::None, &upstream, None)], options);

    let response = server
        .post("/api/open/submit")
        .add_header(CONTENT_LENGTH, HeaderValue::from(64_u64))
        .bytes(Bytes::from(vec![b'x'; 64]))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    submit.assert_async().await;
}

#[tokio::test]
async fn test_custom_api_root() {
    let mut upstream = Server::new_async().await;
    let data = upstream
        .mock("GET", "/data")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let options = GatewayOptions {
        api_root: "/proxy/".to_string(),
        ..GatewayOptions::default()
    };
    let (server, _clock) =
        create_test_server(vec![endpoint("open", AuthMode::None, &upstream, None)], options);

    server.get("/proxy/open/data").await.assert_status_ok();
    server
        .get("/api/open/data")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    data.assert_async().await;
}
