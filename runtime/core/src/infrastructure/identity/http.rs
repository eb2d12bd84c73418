// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! REST-JSON transport for the Identity service
//!
//! Every operation is a signed `POST` of a JSON document to a fixed path on
//! either the data plane or the control plane endpoint.

use super::endpoints::IdentityEndpoints;
use super::sigv4::{AwsCredentials, SigV4Signer};
use crate::domain::identity::{
    CreateWorkloadIdentityRequest, GetResourceApiKeyRequest, GetResourceApiKeyResponse,
    GetResourceOauth2TokenRequest, GetResourceOauth2TokenResponse, GetWorkloadAccessTokenForJwtRequest,
    GetWorkloadAccessTokenForUserIdRequest, GetWorkloadAccessTokenRequest, IdentityApi, IdentityError,
    WorkloadAccessTokenResponse, WorkloadIdentity,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Signing name shared by data plane and control plane operations.
pub const SIGNING_SERVICE: &str = "bedrock-agentcore";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const GET_WORKLOAD_ACCESS_TOKEN: &str = "/identities/GetWorkloadAccessToken";
const GET_WORKLOAD_ACCESS_TOKEN_FOR_JWT: &str = "/identities/GetWorkloadAccessTokenForJWT";
const GET_WORKLOAD_ACCESS_TOKEN_FOR_USER_ID: &str = "/identities/GetWorkloadAccessTokenForUserId";
const GET_RESOURCE_OAUTH2_TOKEN: &str = "/identities/oauth2/token";
const GET_RESOURCE_API_KEY: &str = "/identities/api-key";
const CREATE_WORKLOAD_IDENTITY: &str = "/identities/CreateWorkloadIdentity";
const CREATE_OAUTH2_CREDENTIAL_PROVIDER: &str = "/identities/CreateOauth2CredentialProvider";
const CREATE_API_KEY_CREDENTIAL_PROVIDER: &str = "/identities/CreateApiKeyCredentialProvider";

#[derive(Debug, Clone, Copy)]
enum Plane {
    Data,
    Control,
}

pub struct HttpIdentityApi {
    client: Client,
    endpoints: IdentityEndpoints,
    signer: SigV4Signer,
    /// Fixed credentials; when unset they are read from the environment per request
    credentials: Option<AwsCredentials>,
}

impl HttpIdentityApi {
    pub fn new(region: &str, endpoints: IdentityEndpoints) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoints,
            signer: SigV4Signer::new(region, SIGNING_SERVICE),
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn endpoints(&self) -> &IdentityEndpoints {
        &self.endpoints
    }

    fn url(&self, plane: Plane, path: &str) -> Result<Url, IdentityError> {
        let base = match plane {
            Plane::Data => &self.endpoints.data_plane,
            Plane::Control => &self.endpoints.control_plane,
        };
        base.join(path)
            .map_err(|e| IdentityError::InvalidEndpoint(format!("{}{}: {}", base, path, e)))
    }

    async fn post<Req, Resp>(&self, plane: Plane, path: &str, req: &Req) -> Result<Resp, IdentityError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(plane, path)?;
        let body = serde_json::to_vec(req).map_err(|e| IdentityError::InvalidInput(e.to_string()))?;

        let credentials = match &self.credentials {
            Some(c) => c.clone(),
            None => AwsCredentials::from_env()?,
        };
        let signed = self.signer.sign(
            &credentials,
            "POST",
            &url,
            &[("content-type", "application/json")],
            &body,
            Utc::now(),
        );

        debug!("POST {}", url);
        let mut request = self
            .client
            .post(url)
            .header("content-type", "application/json");
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(IdentityError::Service {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| IdentityError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IdentityApi for HttpIdentityApi {
    async fn get_workload_access_token(
        &self,
        req: &GetWorkloadAccessTokenRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.post(Plane::Data, GET_WORKLOAD_ACCESS_TOKEN, req).await
    }

    async fn get_workload_access_token_for_jwt(
        &self,
        req: &GetWorkloadAccessTokenForJwtRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.post(Plane::Data, GET_WORKLOAD_ACCESS_TOKEN_FOR_JWT, req).await
    }

    async fn get_workload_access_token_for_user_id(
        &self,
        req: &GetWorkloadAccessTokenForUserIdRequest,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        self.post(Plane::Data, GET_WORKLOAD_ACCESS_TOKEN_FOR_USER_ID, req).await
    }

    async fn get_resource_oauth2_token(
        &self,
        req: &GetResourceOauth2TokenRequest,
    ) -> Result<GetResourceOauth2TokenResponse, IdentityError> {
        self.post(Plane::Data, GET_RESOURCE_OAUTH2_TOKEN, req).await
    }

    async fn get_resource_api_key(
        &self,
        req: &GetResourceApiKeyRequest,
    ) -> Result<GetResourceApiKeyResponse, IdentityError> {
        self.post(Plane::Data, GET_RESOURCE_API_KEY, req).await
    }

    async fn create_workload_identity(
        &self,
        req: &CreateWorkloadIdentityRequest,
    ) -> Result<WorkloadIdentity, IdentityError> {
        self.post(Plane::Control, CREATE_WORKLOAD_IDENTITY, req).await
    }

    async fn create_oauth2_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        self.post(Plane::Control, CREATE_OAUTH2_CREDENTIAL_PROVIDER, req).await
    }

    async fn create_api_key_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        self.post(Plane::Control, CREATE_API_KEY_CREDENTIAL_PROVIDER, req).await
    }
}
