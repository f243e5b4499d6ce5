use super::*;
use crate::auth::project_config::{DefaultIdpConfigRequest, GOOGLE_IDP_ID};
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde_json::json;

fn auth_for(server: &MockServer) -> FirebaseAuth {
    let client = ClientBuilder::new(Client::new()).build();
    FirebaseAuth::new_with_client(client, server.url("/v1/projects/test-project"))
}

fn project_config_for(server: &MockServer) -> ProjectConfig {
    let client = ClientBuilder::new(Client::new()).build();
    ProjectConfig::new_with_client(client, server.url("/admin/v2/projects/test-project"))
}

#[tokio::test]
async fn test_list_users() {
    let server = MockServer::start();
    let auth = auth_for(&server);

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/projects/test-project/accounts:batchGet")
            .query_param("maxResults", "100");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "users": [
                    { "localId": "u1", "email": "a@example.com" },
                    { "localId": "u2", "disabled": true }
                ],
                "nextPageToken": "next"
            }));
    });

    let page = auth.list_users(100, None).await.unwrap();
    assert_eq!(page.users.len(), 2);
    assert_eq!(page.users[0].email.as_deref(), Some("a@example.com"));
    assert!(page.users[1].disabled);
    assert_eq!(page.next_page_token.as_deref(), Some("next"));

    mock.assert();
}

#[tokio::test]
async fn test_list_users_empty_project() {
    let server = MockServer::start();
    let auth = auth_for(&server);

    server.mock(|when, then| {
        when.method(GET).path("/v1/projects/test-project/accounts:batchGet");
        then.status(200).json_body(json!({}));
    });

    let page = auth.list_users(10, None).await.unwrap();
    assert!(page.users.is_empty());
}

#[tokio::test]
async fn test_list_users_permission_denied() {
    let server = MockServer::start();
    let auth = auth_for(&server);

    server.mock(|when, then| {
        when.method(GET).path("/v1/projects/test-project/accounts:batchGet");
        then.status(403).json_body(json!({
            "error": { "code": 403, "message": "Caller lacks permission", "status": "PERMISSION_DENIED" }
        }));
    });

    let err = auth.list_users(10, None).await.unwrap_err();
    match err {
        AuthError::ApiError(msg) => {
            assert!(msg.starts_with("List users failed 403"));
            assert!(msg.contains("Caller lacks permission"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_get_google_provider() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/admin/v2/projects/test-project/defaultSupportedIdpConfigs/google.com");
        then.status(200).json_body(json!({
            "name": "projects/test-project/defaultSupportedIdpConfigs/google.com",
            "enabled": true,
            "clientId": "client.apps.googleusercontent.com"
        }));
    });

    let provider = config.get_default_idp_config(GOOGLE_IDP_ID).await.unwrap().unwrap();
    assert!(provider.is_enabled());
    assert_eq!(provider.client_id.as_deref(), Some("client.apps.googleusercontent.com"));
    mock.assert();
}

#[tokio::test]
async fn test_missing_provider_is_none() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    server.mock(|when, then| {
        when.method(GET)
            .path("/admin/v2/projects/test-project/defaultSupportedIdpConfigs/google.com");
        then.status(404).json_body(json!({
            "error": { "code": 404, "message": "CONFIGURATION_NOT_FOUND" }
        }));
    });

    assert!(config.get_default_idp_config(GOOGLE_IDP_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_google_provider() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    let request = DefaultIdpConfigRequest {
        enabled: Some(true),
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
    };

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/admin/v2/projects/test-project/defaultSupportedIdpConfigs")
            .query_param("idpId", "google.com")
            .json_body(json!({
                "enabled": true,
                "clientId": "id",
                "clientSecret": "secret"
            }));
        then.status(200).json_body(json!({
            "name": "projects/test-project/defaultSupportedIdpConfigs/google.com",
            "enabled": true,
            "clientId": "id"
        }));
    });

    let created = config.create_default_idp_config(GOOGLE_IDP_ID, &request).await.unwrap();
    assert!(created.is_enabled());
    mock.assert();
}

#[tokio::test]
async fn test_update_google_provider_sends_mask() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    let request = DefaultIdpConfigRequest {
        enabled: Some(true),
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
    };

    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/admin/v2/projects/test-project/defaultSupportedIdpConfigs/google.com")
            .query_param("updateMask", "enabled,clientId,clientSecret");
        then.status(200).json_body(json!({ "enabled": true, "clientId": "id" }));
    });

    config.update_default_idp_config(GOOGLE_IDP_ID, &request).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_identity_config() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    server.mock(|when, then| {
        when.method(GET).path("/admin/v2/projects/test-project/config");
        then.status(200).json_body(json!({
            "name": "projects/test-project/config",
            "signIn": { "email": { "enabled": true }, "anonymous": { "enabled": false } }
        }));
    });

    let identity = config.get_identity_config().await.unwrap().unwrap();
    let sign_in = identity.sign_in.unwrap();
    assert!(sign_in.email_enabled());
    assert!(!sign_in.anonymous_enabled());
}

#[tokio::test]
async fn test_identity_config_not_configured() {
    let server = MockServer::start();
    let config = project_config_for(&server);

    server.mock(|when, then| {
        when.method(GET).path("/admin/v2/projects/test-project/config");
        then.status(404);
    });

    assert!(config.get_identity_config().await.unwrap().is_none());
}
