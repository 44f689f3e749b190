mod common;

use blog_repurposer::AgentError;
use blog_repurposer::config::ClientCredentials;
use blog_repurposer::post::Platform;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds() -> ClientCredentials {
    ClientCredentials {
        client_id: "fb-app".into(),
        client_secret: "fb-secret".into(),
        redirect_uri: "http://localhost:5000/callback/facebook".into(),
    }
}

#[tokio::test]
async fn exchanges_code_for_access_token() {
    common::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("client_id=fb-app"))
        .and(body_string_contains("client_secret=fb-secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = common::oauth_against(&server.uri());
    let token = client
        .exchange_code(Platform::Facebook, &creds(), "abc123")
        .await
        .unwrap();
    assert_eq!(token, "tok-1");
}

#[tokio::test]
async fn tiktok_sends_client_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tiktok/token"))
        .and(body_string_contains("client_key=fb-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tt"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::oauth_against(&server.uri());
    let token = client.exchange_code(Platform::Tiktok, &creds(), "c").await.unwrap();
    assert_eq!(token, "tt");
}

#[tokio::test]
async fn error_payload_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instagram/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"error": "invalid_grant", "error_description": "code expired"}),
        ))
        .mount(&server)
        .await;

    let client = common::oauth_against(&server.uri());
    let err = client
        .exchange_code(Platform::Instagram, &creds(), "old")
        .await
        .unwrap_err();
    match err {
        AgentError::OAuth { platform, message } => {
            assert_eq!(platform, Platform::Instagram);
            assert_eq!(message, "code expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_success_status_is_platform_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad client"))
        .mount(&server)
        .await;

    let client = common::oauth_against(&server.uri());
    let err = client
        .exchange_code(Platform::Facebook, &creds(), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Platform { status: 401, .. }), "{err:?}");
}
