//! Integration tests for the NetSapiens adapter against a stubbed vendor
//! API, covering OAuth token acquisition, lazy refresh, and response
//! normalization.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ucaas_bridge::adapters::{AdapterConfig, NetSapiensAdapter, VoipAdapter};
use ucaas_bridge::error::ErrorCode;

fn adapter_for(server: &MockServer) -> NetSapiensAdapter {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let config = AdapterConfig::new(server.uri())
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret")
        .with_config("domain", "testdental");
    NetSapiensAdapter::new(config)
}

async fn mount_token(server: &MockServer, token: &str, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_acquires_token_via_form_post() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
}

#[tokio::test]
async fn valid_token_is_not_refreshed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscribers": [],
            "total": 0,
        })))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.list_users(1, 50, None, None).await.unwrap();
    adapter.list_users(1, 50, None, None).await.unwrap();
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_refresh() {
    let server = MockServer::start().await;

    // First token expires immediately; the refresh hands out a long-lived one.
    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-stale",
            "expires_in": 0,
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-fresh",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The operation must go out with the refreshed token, never the stale one.
    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .and(header("Authorization", "Bearer tok-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscribers": [],
            "total": 0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.list_users(1, 50, None, None).await.unwrap();
}

#[tokio::test]
async fn expires_in_accepts_string_seconds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": "3600",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscribers": [],
            "total": 0,
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.list_users(1, 50, None, None).await.unwrap();
}

#[tokio::test]
async fn token_response_domain_overrides_configured_domain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
            "domain": "realdental",
        })))
        .mount(&server)
        .await;

    // Subsequent requests must carry the vendor's tenant name, not the
    // locally configured one.
    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .and(query_param("domain", "realdental"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscribers": [{"user_id": "sub-1", "user": "jsmith"}],
            "total": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    let page = adapter.list_users(1, 50, None, None).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].username, "jsmith");
}

#[tokio::test]
async fn missing_credentials_fail_fast_naming_fields() {
    let server = MockServer::start().await;
    let config = AdapterConfig::new(server.uri()).with_credential("client_id", "test-client");
    let adapter = NetSapiensAdapter::new(config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthError);
    assert_eq!(err.message, "Missing required credentials: client_secret");
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn password_grant_requires_username_and_password() {
    let server = MockServer::start().await;
    let config = AdapterConfig::new(server.uri())
        .with_credential("grant_type", "password")
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret");
    let adapter = NetSapiensAdapter::new(config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthError);
    assert_eq!(
        err.message,
        "Missing required credentials: username, password"
    );
}

#[tokio::test]
async fn unknown_grant_type_is_rejected() {
    let server = MockServer::start().await;
    let config = AdapterConfig::new(server.uri())
        .with_credential("grant_type", "authorization_code")
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret");
    let adapter = NetSapiensAdapter::new(config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthError);
    assert_eq!(
        err.message,
        "Unsupported grant_type: authorization_code. Supported: client_credentials, password"
    );
}

#[tokio::test]
async fn rejected_token_request_surfaces_vendor_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed",
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthError);
    assert!(err.message.contains("401"));
    assert!(err.message.contains("Client authentication failed"));
    assert!(err.provider_error.is_some());
}

#[tokio::test]
async fn slow_token_endpoint_maps_to_auth_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok-1", "expires_in": 3600 }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = AdapterConfig::new(server.uri())
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret")
        .with_timeout(Duration::from_millis(100));
    let adapter = NetSapiensAdapter::new(config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthTimeout);
    assert_eq!(err.message, "OAuth token request timed out");
}

#[tokio::test]
async fn slow_api_response_maps_to_timeout() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "subscribers": [], "total": 0 }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = AdapterConfig::new(server.uri())
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret")
        .with_config("domain", "testdental")
        .with_timeout(Duration::from_millis(100));
    let adapter = NetSapiensAdapter::new(config);
    adapter.connect().await.unwrap();

    let err = adapter.list_users(1, 50, None, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Timeout);
    assert_eq!(err.message, "Request timed out");
}

#[tokio::test]
async fn large_page_values_produce_wide_offsets() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    // 100_000 * 99_999 does not fit in u32; the offset must still be exact.
    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .and(query_param("offset", "9999900000"))
        .and(query_param("limit", "100000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscribers": [],
            "total": 0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.list_users(100_000, 100_000, None, None).await.unwrap();
}

#[tokio::test]
async fn vendor_error_status_maps_to_http_code_with_raw_body() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(r#"{"error": "subscriber not found"}"#),
        )
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();

    let err = adapter.get_user("ghost").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Http(404));
    assert_eq!(err.message, "API request failed: 404");
    assert_eq!(
        err.provider_error.as_deref(),
        Some(r#"{"error": "subscriber not found"}"#)
    );
}

#[tokio::test]
async fn unparseable_body_maps_to_parse_error_with_bounded_preview() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    let garbage = "<html>".to_string() + &"x".repeat(10_000);
    Mock::given(method("GET"))
        .and(path("/ns-api/v2/subscribers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(garbage))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();

    let err = adapter.list_users(1, 50, None, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ParseError);
    let preview = err.provider_error.expect("preview");
    assert!(preview.len() <= 256 + 3);
    assert!(preview.ends_with("..."));
}

#[tokio::test]
async fn empty_body_is_a_valid_empty_payload() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    Mock::given(method("DELETE"))
        .and(path("/ns-api/v2/subscribers/user-1"))
        .and(query_param("domain", "testdental"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.delete_user("user-1").await.unwrap();
}

#[tokio::test]
async fn invalid_base_url_is_a_connection_error() {
    let config = AdapterConfig::new("not a url")
        .with_credential("client_id", "test-client")
        .with_credential("client_secret", "test-secret");
    let adapter = NetSapiensAdapter::new(config);

    let err = adapter.connect().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConnectionError);
    assert!(err.message.contains("Invalid base URL"));
}

#[tokio::test]
async fn operations_before_connect_are_not_connected() {
    let server = MockServer::start().await;
    let adapter = adapter_for(&server);

    let err = adapter.list_users(1, 50, None, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotConnected);
}

#[tokio::test]
async fn disconnect_drops_client_and_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();
    adapter.disconnect().await;
    adapter.disconnect().await;

    let err = adapter.health_check().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotConnected);
}

#[tokio::test]
async fn call_action_normalizes_empty_ack() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600).await;

    Mock::given(method("POST"))
        .and(path("/ns-api/v2/calls/call-42/hold"))
        .and(body_string_contains("testdental"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    adapter.connect().await.unwrap();

    let ack = adapter.hold_call("call-42").await.unwrap();
    assert_eq!(ack, json!({ "hold": true, "call_id": "call-42" }));
}
