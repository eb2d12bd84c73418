// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity
//!
//! Domain interface for the AgentCore Identity service (Anti-Corruption Layer).
//! The request and response shapes mirror the service's REST-JSON wire format;
//! the [`IdentityApi`] trait isolates callers from the transport so the
//! high-level client can be exercised without AWS.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Identity wire types, errors, transport and polling seams

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// OAuth2 flow requested from a credential provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFlow {
    #[serde(rename = "M2M")]
    M2M,
    #[serde(rename = "USER_FEDERATION")]
    UserFederation,
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFlow::M2M => f.write_str("M2M"),
            AuthFlow::UserFederation => f.write_str("USER_FEDERATION"),
        }
    }
}

impl std::str::FromStr for AuthFlow {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M2M" => Ok(AuthFlow::M2M),
            "USER_FEDERATION" => Ok(AuthFlow::UserFederation),
            other => Err(IdentityError::InvalidInput(format!("Invalid auth flow: {}", other))),
        }
    }
}

/// Parameters of [`crate::IdentityClient::get_token`].
#[derive(Debug, Clone)]
pub struct GetTokenRequest {
    pub provider_name: String,
    pub scopes: Option<Vec<String>>,
    pub agent_identity_token: String,
    pub auth_flow: AuthFlow,
    /// Must be pre-registered with the credential provider
    pub callback_url: Option<String>,
    /// Re-authenticate even if the token vault already holds a token
    pub force_authentication: bool,
}

impl GetTokenRequest {
    pub fn new(
        provider_name: impl Into<String>,
        agent_identity_token: impl Into<String>,
        auth_flow: AuthFlow,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            scopes: None,
            agent_identity_token: agent_identity_token.into(),
            auth_flow,
            callback_url: None,
            force_authentication: false,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_force_authentication(mut self, force: bool) -> Self {
        self.force_authentication = force;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWorkloadAccessTokenRequest {
    pub workload_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWorkloadAccessTokenForJwtRequest {
    pub workload_name: String,
    pub user_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWorkloadAccessTokenForUserIdRequest {
    pub workload_name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadAccessTokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_access_token: Option<String>,
    /// Local tracking id assigned when the token was registered for cleanup
    #[serde(rename = "_token_id", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourceOauth2TokenRequest {
    pub resource_credential_provider_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    pub oauth2_flow: AuthFlow,
    pub workload_identity_token: String,
    #[serde(rename = "callBackUrl", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_authentication: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourceOauth2TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourceApiKeyRequest {
    pub resource_credential_provider_name: String,
    pub workload_identity_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResourceApiKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkloadIdentityRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadIdentity {
    pub name: String,
    #[serde(default)]
    pub workload_identity_arn: Option<String>,
    #[serde(default)]
    pub allowed_resource_oauth2_return_urls: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("AWS credentials unavailable: {0}")]
    Credentials(String),

    #[error("Request to Identity service failed: {0}")]
    Transport(String),

    #[error("Identity service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Failed to decode Identity service response: {0}")]
    Decode(String),

    #[error("Identity service did not return a token or an authorization URL.")]
    NoTokenOrAuthorizationUrl,

    #[error("Polling timed out after {0} seconds. User may not have completed authorization.")]
    PollingTimeout(u64),
}

/// Transport for Identity service operations.
///
/// One method per service operation, each returning the decoded response.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn get_workload_access_token(
        &self,
        req: &GetWorkloadAccessTokenRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError>;

    async fn get_workload_access_token_for_jwt(
        &self,
        req: &GetWorkloadAccessTokenForJwtRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError>;

    async fn get_workload_access_token_for_user_id(
        &self,
        req: &GetWorkloadAccessTokenForUserIdRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError>;

    async fn get_resource_oauth2_token(
        &self,
        req: &GetResourceOauth2TokenRequest,
    ) -> Result<GetResourceOauth2TokenResponse, IdentityError>;

    async fn get_resource_api_key(
        &self,
        req: &GetResourceApiKeyRequest,
    ) -> Result<GetResourceApiKeyResponse, IdentityError>;

    async fn create_workload_identity(
        &self,
        req: &CreateWorkloadIdentityRequest,
    ) -> Result<WorkloadIdentity, IdentityError>;

    /// Control plane; the request is forwarded as-is.
    async fn create_oauth2_credential_provider(&self, req: &Value) -> Result<Value, IdentityError>;

    /// Control plane; the request is forwarded as-is.
    async fn create_api_key_credential_provider(&self, req: &Value) -> Result<Value, IdentityError>;
}

/// Waits for a user to finish an OAuth2 authorization and returns the token.
#[async_trait]
pub trait TokenPoller: Send + Sync {
    async fn poll_for_token(&self) -> Result<String, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_oauth2_request_wire_format() {
        let req = GetResourceOauth2TokenRequest {
            resource_credential_provider_name: "github".to_string(),
            scopes: Some(vec!["repo".to_string()]),
            oauth2_flow: AuthFlow::UserFederation,
            workload_identity_token: "wit".to_string(),
            callback_url: Some("https://example.com/cb".to_string()),
            force_authentication: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "resourceCredentialProviderName": "github",
                "scopes": ["repo"],
                "oauth2Flow": "USER_FEDERATION",
                "workloadIdentityToken": "wit",
                "callBackUrl": "https://example.com/cb",
            })
        );
    }

    #[test]
    fn test_auth_flow_parse() {
        assert_eq!("M2M".parse::<AuthFlow>().unwrap(), AuthFlow::M2M);
        assert!("PASSWORD".parse::<AuthFlow>().is_err());
    }

    #[test]
    fn test_oauth2_response_variants() {
        let token: GetResourceOauth2TokenResponse =
            serde_json::from_value(json!({"accessToken": "abc"})).unwrap();
        assert_eq!(token.access_token.as_deref(), Some("abc"));
        assert!(token.authorization_url.is_none());

        let url: GetResourceOauth2TokenResponse =
            serde_json::from_value(json!({"authorizationUrl": "https://auth"})).unwrap();
        assert!(url.access_token.is_none());
    }

    #[test]
    fn test_workload_token_response_wire_name() {
        let resp: WorkloadAccessTokenResponse =
            serde_json::from_value(json!({"workloadAccessToken": "wat-real"})).unwrap();
        assert_eq!(resp.workload_access_token.as_deref(), Some("wat-real"));
        assert!(resp.token_id.is_none());

        let stale: WorkloadAccessTokenResponse =
            serde_json::from_value(json!({"accessToken": "wat"})).unwrap();
        assert!(stale.workload_access_token.is_none());
    }
}
