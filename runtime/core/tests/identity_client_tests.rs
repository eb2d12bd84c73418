// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tests for the high-level identity client.
//!
//! Most tests run against an in-memory `IdentityApi` that records every call;
//! the last ones go over HTTP to a mockito server through the signed transport.

use agentcore_core::domain::identity::*;
use agentcore_core::infrastructure::identity::{AwsCredentials, HttpIdentityApi, IdentityEndpoints};
use agentcore_core::IdentityClient;
use async_trait::async_trait;
use mockito::Matcher;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingApi {
    workload_calls: Mutex<Vec<String>>,
    oauth2_calls: Mutex<Vec<GetResourceOauth2TokenRequest>>,
    /// Responses handed out by `get_resource_oauth2_token`, front first
    oauth2_responses: Mutex<Vec<GetResourceOauth2TokenResponse>>,
    created: Mutex<Vec<String>>,
}

impl RecordingApi {
    fn with_oauth2_responses(responses: Vec<GetResourceOauth2TokenResponse>) -> Self {
        Self {
            oauth2_responses: Mutex::new(responses),
            ..Default::default()
        }
    }
}

fn token_response() -> WorkloadAccessTokenResponse {
    WorkloadAccessTokenResponse {
        workload_access_token: Some("workload-token".to_string()),
        token_id: None,
    }
}

#[async_trait]
impl IdentityApi for RecordingApi {
    async fn get_workload_access_token(
        &self,
        req: &GetWorkloadAccessTokenRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.workload_calls.lock().push(format!("plain:{}", req.workload_name));
        Ok(token_response())
    }

    async fn get_workload_access_token_for_jwt(
        &self,
        req: &GetWorkloadAccessTokenForJwtRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.workload_calls.lock().push(format!("jwt:{}", req.user_token));
        Ok(token_response())
    }

    async fn get_workload_access_token_for_user_id(
        &self,
        req: &GetWorkloadAccessTokenForUserIdRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.workload_calls.lock().push(format!("user:{}", req.user_id));
        Ok(token_response())
    }

    async fn get_resource_oauth2_token(
        &self,
        req: &GetResourceOauth2TokenRequest,
    ) -> Result<GetResourceOauth2TokenResponse, IdentityError> {
        self.oauth2_calls.lock().push(req.clone());
        let mut responses = self.oauth2_responses.lock();
        if responses.is_empty() {
            return Ok(GetResourceOauth2TokenResponse::default());
        }
        Ok(responses.remove(0))
    }

    async fn get_resource_api_key(
        &self,
        req: &GetResourceApiKeyRequest,
    ) -> Result<GetResourceApiKeyResponse, IdentityError> {
        Ok(GetResourceApiKeyResponse {
            api_key: format!("key-for-{}", req.resource_credential_provider_name),
        })
    }

    async fn create_workload_identity(
        &self,
        req: &CreateWorkloadIdentityRequest,
    ) -> Result<WorkloadIdentity, IdentityError> {
        self.created.lock().push(req.name.clone());
        Ok(WorkloadIdentity {
            name: req.name.clone(),
            workload_identity_arn: None,
            allowed_resource_oauth2_return_urls: None,
        })
    }

    async fn create_oauth2_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        Ok(json!({"created": req["name"]}))
    }

    async fn create_api_key_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        Ok(json!({"created": req["name"]}))
    }
}

fn client(api: Arc<RecordingApi>) -> IdentityClient {
    IdentityClient::with_api("us-west-2", api).unwrap()
}

fn token(value: &str) -> GetResourceOauth2TokenResponse {
    GetResourceOauth2TokenResponse {
        access_token: Some(value.to_string()),
        authorization_url: None,
    }
}

fn auth_url(value: &str) -> GetResourceOauth2TokenResponse {
    GetResourceOauth2TokenResponse {
        access_token: None,
        authorization_url: Some(value.to_string()),
    }
}

#[test]
fn test_with_api_rejects_empty_region() {
    let api: Arc<dyn IdentityApi> = Arc::new(RecordingApi::default());
    assert!(IdentityClient::with_api("", api).is_err());
}

#[tokio::test]
async fn test_workload_token_variants() {
    let api = Arc::new(RecordingApi::default());
    let client = client(api.clone());

    let resp = client.get_workload_access_token("agent", None, None).await.unwrap();
    assert!(resp.token_id.unwrap().starts_with("workload_agent_"));

    client
        .get_workload_access_token("agent", None, Some("user-1"))
        .await
        .unwrap();
    client
        .get_workload_access_token("agent", Some("jwt"), Some("user-1"))
        .await
        .unwrap();

    assert_eq!(
        *api.workload_calls.lock(),
        vec!["plain:agent", "user:user-1", "jwt:jwt"]
    );
    assert_eq!(client.tracked_token_count(), 3);
}

#[tokio::test]
async fn test_workload_token_validation() {
    let api = Arc::new(RecordingApi::default());
    let client = client(api.clone());

    let err = client
        .get_workload_access_token("bad name!", None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Invalid workload name format"));

    let err = client
        .get_workload_access_token("agent", None, Some("   "))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User ID cannot be empty");
    assert!(api.workload_calls.lock().is_empty());
}

#[tokio::test]
async fn test_create_workload_identity_generates_name() {
    let api = Arc::new(RecordingApi::default());
    let client = client(api.clone());

    let identity = client.create_workload_identity(None).await.unwrap();
    assert!(identity.name.starts_with("workload-"));
    assert_eq!(identity.name.len(), "workload-".len() + 8);

    client.create_workload_identity(Some("named-agent")).await.unwrap();
    assert_eq!(api.created.lock()[1], "named-agent");

    assert!(client.create_workload_identity(Some("../etc")).await.is_err());
}

#[tokio::test]
async fn test_get_token_direct() {
    let api = Arc::new(RecordingApi::with_oauth2_responses(vec![token("access")]));
    let client = client(api.clone());

    let request = GetTokenRequest::new("github", "wit", AuthFlow::M2M)
        .with_scopes(vec!["repo".to_string()])
        .with_callback_url("https://example.com/cb");
    let value = client.get_token(request, None, None).await.unwrap();

    assert_eq!(value, "access");
    let sent = &api.oauth2_calls.lock()[0];
    assert_eq!(sent.scopes, Some(vec!["repo".to_string()]));
    assert_eq!(sent.callback_url.as_deref(), Some("https://example.com/cb"));
    assert_eq!(sent.force_authentication, None);
    assert_eq!(client.tracked_token_count(), 1);
}

#[tokio::test]
async fn test_get_token_validation() {
    let client = client(Arc::new(RecordingApi::default()));

    let err = client
        .get_token(GetTokenRequest::new(" ", "wit", AuthFlow::M2M), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Provider name cannot be empty");

    let err = client
        .get_token(GetTokenRequest::new("github", "", AuthFlow::M2M), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Agent identity token cannot be empty");
}

#[tokio::test]
async fn test_get_token_without_token_or_url() {
    let client = client(Arc::new(RecordingApi::default()));
    let err = client
        .get_token(GetTokenRequest::new("github", "wit", AuthFlow::M2M), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::NoTokenOrAuthorizationUrl));
}

#[tokio::test(start_paused = true)]
async fn test_get_token_user_federation_polls() {
    let api = Arc::new(RecordingApi::with_oauth2_responses(vec![
        auth_url("https://auth.example.com/consent"),
        GetResourceOauth2TokenResponse::default(),
        token("federated"),
    ]));
    let client = client(api.clone()).with_polling(Duration::from_secs(2), Duration::from_secs(30));

    let seen = Mutex::new(Vec::new());
    let on_auth_url = |url: &str| seen.lock().push(url.to_string());
    let request = GetTokenRequest::new("google", "wit", AuthFlow::UserFederation).with_force_authentication(true);

    let value = client.get_token(request, Some(&on_auth_url), None).await.unwrap();

    assert_eq!(value, "federated");
    assert_eq!(*seen.lock(), vec!["https://auth.example.com/consent"]);

    let calls = api.oauth2_calls.lock();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].force_authentication, Some(true));
    assert!(calls[1..].iter().all(|c| c.force_authentication == Some(false)));
}

#[tokio::test(start_paused = true)]
async fn test_get_token_polling_timeout() {
    let api = Arc::new(RecordingApi::with_oauth2_responses(vec![auth_url("https://auth")]));
    let client = client(api).with_polling(Duration::from_secs(5), Duration::from_secs(20));

    let err = client
        .get_token(GetTokenRequest::new("google", "wit", AuthFlow::UserFederation), None, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Polling timed out after 20 seconds. User may not have completed authorization."
    );
}

struct FixedPoller(&'static str);

#[async_trait]
impl TokenPoller for FixedPoller {
    async fn poll_for_token(&self) -> Result<String, IdentityError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_get_token_custom_poller() {
    let api = Arc::new(RecordingApi::with_oauth2_responses(vec![auth_url("https://auth")]));
    let client = client(api.clone());

    let value = client
        .get_token(
            GetTokenRequest::new("google", "wit", AuthFlow::UserFederation),
            None,
            Some(&FixedPoller("from-poller")),
        )
        .await
        .unwrap();
    assert_eq!(value, "from-poller");
    assert_eq!(api.oauth2_calls.lock().len(), 1);
}

#[tokio::test]
async fn test_api_key_and_cleanup() {
    let client = client(Arc::new(RecordingApi::default()));

    assert_eq!(client.get_api_key("openai", "wit").await.unwrap(), "key-for-openai");
    assert!(client.get_api_key("openai", " ").await.is_err());
    client.get_workload_access_token("agent", None, None).await.unwrap();

    assert_eq!(client.cleanup_tokens(), 2);
    assert_eq!(client.tracked_token_count(), 0);
}

#[tokio::test]
async fn test_credential_providers_forwarded() {
    let client = client(Arc::new(RecordingApi::default()));
    let created = client
        .create_oauth2_credential_provider(&json!({"name": "github"}))
        .await
        .unwrap();
    assert_eq!(created, json!({"created": "github"}));

    let created = client
        .create_api_key_credential_provider(&json!({"name": "openai", "apiKey": "sk"}))
        .await
        .unwrap();
    assert_eq!(created, json!({"created": "openai"}));
}

fn http_client(server: &mockito::ServerGuard) -> IdentityClient {
    let endpoints = IdentityEndpoints::resolve("us-east-1", Some(&server.url()), Some(&server.url())).unwrap();
    let api = HttpIdentityApi::new("us-east-1", endpoints)
        .unwrap()
        .with_credentials(AwsCredentials::new("AKIDTEST", "secret", Some("session".to_string())));
    IdentityClient::with_api("us-east-1", Arc::new(api)).unwrap()
}

#[tokio::test]
async fn test_http_get_token_for_user_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/identities/GetWorkloadAccessTokenForUserId")
        .match_header("x-amz-security-token", "session")
        .match_body(Matcher::Json(json!({"workloadName": "agent", "userId": "alice"})))
        .with_status(200)
        .with_body(r#"{"workloadAccessToken":"wat"}"#)
        .create_async()
        .await;

    let client = http_client(&server);
    let resp = client
        .get_workload_access_token("agent", None, Some("alice"))
        .await
        .unwrap();
    assert_eq!(resp.workload_access_token.as_deref(), Some("wat"));
    assert!(resp.token_id.as_deref().is_some_and(|id| id.starts_with("workload_agent_")));
    assert_eq!(client.tracked_token_count(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_oauth2_wire_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/identities/oauth2/token")
        .match_body(Matcher::Json(json!({
            "resourceCredentialProviderName": "github",
            "scopes": ["repo"],
            "oauth2Flow": "M2M",
            "workloadIdentityToken": "wit",
        })))
        .with_status(200)
        .with_body(r#"{"accessToken":"gh-token"}"#)
        .create_async()
        .await;

    let value = http_client(&server)
        .get_token(
            GetTokenRequest::new("github", "wit", AuthFlow::M2M).with_scopes(vec!["repo".to_string()]),
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(value, "gh-token");
    mock.assert_async().await;
}
