use std::{collections::HashMap, sync::Arc};

use polaroidcli::config::SpotifyConfig;
use polaroidcli::error::ClientError;
use polaroidcli::management::{MemoryStorage, Storage, TokenStore};
use polaroidcli::spotify::auth::OAuthClient;
use polaroidcli::types::TokenRecord;
use polaroidcli::utils::{generate_code_challenge, now_millis};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> SpotifyConfig {
    let mut config = SpotifyConfig::new("client-123");
    config.token_url = format!("{}/api/token", server.uri());
    config.api_url = format!("{}/v1", server.uri());
    config
}

fn oauth_client(server: &MockServer) -> (OAuthClient, TokenStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(storage.clone());
    let client = OAuthClient::new(test_config(server), store.clone());
    (client, store, storage)
}

fn token_response(access: &str, refresh: Option<&str>) -> ResponseTemplate {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": 3600,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn test_login_url_carries_pkce_parameters() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    let url = client.build_login_url().await.unwrap();
    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(url.path(), "/authorize");

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "client-123");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/callback");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["scope"], client.config().scope);
    assert!(params["scope"].contains("user-top-read"));

    let verifier = store.code_verifier().await.unwrap().unwrap();
    assert_eq!(verifier.len(), 128);
    assert_eq!(params["code_challenge"], generate_code_challenge(&verifier));
}

#[tokio::test]
async fn test_login_url_challenge_matches_verifier_for_every_length() {
    let server = MockServer::start().await;

    for length in 43..=128 {
        let mut config = test_config(&server);
        config.verifier_length = length;
        let store = TokenStore::new(Arc::new(MemoryStorage::new()));
        let client = OAuthClient::new(config, store.clone());

        let url = client.build_login_url().await.unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let verifier = store.code_verifier().await.unwrap().unwrap();

        assert_eq!(verifier.len(), length);
        assert_eq!(params["code_challenge"], generate_code_challenge(&verifier));
    }
}

#[tokio::test]
async fn test_new_login_replaces_previous_verifier() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    client.build_login_url().await.unwrap();
    let first = store.code_verifier().await.unwrap().unwrap();
    client.build_login_url().await.unwrap();
    let second = store.code_verifier().await.unwrap().unwrap();

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_exchange_code_stores_token_record() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("code_verifier="))
        .respond_with(token_response("A", Some("R")))
        .expect(1)
        .mount(&server)
        .await;

    client.build_login_url().await.unwrap();
    let before = now_millis();
    let record = client.exchange_code("abc").await.unwrap();
    let after = now_millis();

    assert_eq!(record.access_token, "A");
    assert_eq!(record.refresh_token.as_deref(), Some("R"));
    assert!(record.expires_at >= before + 3_600_000);
    assert!(record.expires_at <= after + 3_600_000);

    assert_eq!(store.record().await.unwrap(), Some(record));
    assert_eq!(store.code_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_exchange_without_verifier_leaves_store_untouched() {
    let server = MockServer::start().await;
    let (client, store, storage) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_response("A", Some("R")))
        .expect(0)
        .mount(&server)
        .await;

    let existing = TokenRecord {
        access_token: "OLD".to_string(),
        refresh_token: Some("OLD_R".to_string()),
        expires_at: now_millis() + 60_000,
    };
    store.save_record(&existing).await.unwrap();

    let result = client.exchange_code("abc").await;
    assert_eq!(result, Err(ClientError::MissingVerifier));
    assert_eq!(store.record().await.unwrap(), Some(existing));
    assert_eq!(storage.len().await, 3);
}

#[tokio::test]
async fn test_exchange_failure_reports_provider_description() {
    let server = MockServer::start().await;
    let (client, _, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&server)
        .await;

    client.build_login_url().await.unwrap();
    let result = client.exchange_code("expired").await;

    assert_eq!(
        result,
        Err(ClientError::TokenExchangeFailed(
            "Invalid authorization code".to_string()
        ))
    );
}

#[tokio::test]
async fn test_exchange_rejects_empty_access_token() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_response("", Some("R")))
        .mount(&server)
        .await;

    client.build_login_url().await.unwrap();
    let result = client.exchange_code("abc").await;

    assert!(matches!(result, Err(ClientError::TokenExchangeFailed(_))));
    assert_eq!(store.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_none_returned() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R"))
        .respond_with(token_response("B", None))
        .expect(1)
        .mount(&server)
        .await;

    store
        .save_record(&TokenRecord {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_at: 0,
        })
        .await
        .unwrap();

    let record = client.refresh().await.unwrap();
    assert_eq!(record.access_token, "B");
    assert_eq!(record.refresh_token.as_deref(), Some("R"));
    assert!(record.expires_at > now_millis());
    assert_eq!(store.record().await.unwrap(), Some(record));
}

#[tokio::test]
async fn test_refresh_rotates_refresh_token() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_response("B", Some("R2")))
        .mount(&server)
        .await;

    store
        .save_record(&TokenRecord {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_at: 0,
        })
        .await
        .unwrap();

    client.refresh().await.unwrap();
    assert_eq!(store.refresh_token().await.unwrap().as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_refresh_without_refresh_token() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(token_response("B", None))
        .expect(0)
        .mount(&server)
        .await;

    store
        .save_record(&TokenRecord {
            access_token: "A".to_string(),
            refresh_token: None,
            expires_at: 0,
        })
        .await
        .unwrap();

    assert_eq!(client.refresh().await, Err(ClientError::NoRefreshToken));
}

#[tokio::test]
async fn test_refresh_rejected_by_provider() {
    let server = MockServer::start().await;
    let (client, store, _) = oauth_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&server)
        .await;

    store
        .save_record(&TokenRecord {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_at: 0,
        })
        .await
        .unwrap();

    let expected = ClientError::RefreshFailed("Refresh token revoked".to_string());
    assert_eq!(client.refresh().await, Err(expected));
}

#[tokio::test]
async fn test_token_store_clear_is_idempotent() {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(storage.clone());

    store
        .save_record(&TokenRecord {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            expires_at: 42,
        })
        .await
        .unwrap();
    store.save_code_verifier("verifier").await.unwrap();
    assert_eq!(storage.len().await, 4);

    store.clear().await.unwrap();
    assert!(store.is_empty().await.unwrap());
    store.clear().await.unwrap();
    assert!(store.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_token_store_record_edge_cases() {
    let storage = Arc::new(MemoryStorage::new());
    let store = TokenStore::new(storage.clone());

    // no access token, no record
    storage.set("refreshToken", "R").await.unwrap();
    assert_eq!(store.record().await.unwrap(), None);

    storage.set("accessToken", "").await.unwrap();
    assert_eq!(store.record().await.unwrap(), None);

    // unreadable expiry counts as expired
    storage.set("accessToken", "A").await.unwrap();
    storage.set("tokenExpiration", "soon").await.unwrap();
    let record = store.record().await.unwrap().unwrap();
    assert_eq!(record.expires_at, 0);
    assert!(record.is_expired_at(now_millis()));
}
