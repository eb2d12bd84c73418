// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity client
//!
//! High-level client for AgentCore Identity: workload identities, workload
//! access tokens, and OAuth2 tokens or API keys from credential providers.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Validate inputs, drive the OAuth2 authorization flow and track vended credentials
//! - **Integration:** Domain `IdentityApi` seam → `HttpIdentityApi` (SigV4 over reqwest)
//!
//! # Usage
//!
//! ```no_run
//! use agentcore_core::domain::identity::{AuthFlow, GetTokenRequest};
//! use agentcore_core::IdentityClient;
//!
//! # async fn run() -> Result<(), agentcore_core::domain::identity::IdentityError> {
//! let client = IdentityClient::new("us-west-2")?;
//! let workload = client.get_workload_access_token("my-agent", None, Some("user-1")).await?;
//!
//! let token = client
//!     .get_token(
//!         GetTokenRequest::new("github", workload.workload_access_token.unwrap_or_default(), AuthFlow::UserFederation)
//!             .with_scopes(vec!["repo".to_string()]),
//!         Some(&|url: &str| println!("Authorize at {}", url)),
//!         None,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::domain::config::{IdentityConfig, CONTROL_PLANE_ENDPOINT_ENV, DATA_PLANE_ENDPOINT_ENV};
use crate::domain::identity::{
    CreateWorkloadIdentityRequest, GetResourceApiKeyRequest, GetResourceOauth2TokenRequest, GetTokenRequest,
    GetWorkloadAccessTokenForJwtRequest, GetWorkloadAccessTokenForUserIdRequest, GetWorkloadAccessTokenRequest,
    IdentityApi, IdentityError, TokenPoller, WorkloadAccessTokenResponse, WorkloadIdentity,
};
use crate::domain::security::{SecurityValidator, TokenManager};
use crate::infrastructure::identity::poller::{DEFAULT_POLLING_INTERVAL, DEFAULT_POLLING_TIMEOUT};
use crate::infrastructure::identity::{DefaultApiTokenPoller, HttpIdentityApi, IdentityEndpoints};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Callback receiving the authorization URL the user has to visit.
pub type AuthUrlCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

pub struct IdentityClient {
    region: String,
    api: Arc<dyn IdentityApi>,
    token_manager: TokenManager,
    polling_interval: Duration,
    polling_timeout: Duration,
}

impl IdentityClient {
    /// Client for `region` using the default endpoints, or the ones named by
    /// `BEDROCK_AGENTCORE_DP_ENDPOINT` / `BEDROCK_AGENTCORE_CP_ENDPOINT`.
    /// Credentials come from the standard AWS environment variables.
    pub fn new(region: &str) -> Result<Self, IdentityError> {
        let dp = std::env::var(DATA_PLANE_ENDPOINT_ENV).ok();
        let cp = std::env::var(CONTROL_PLANE_ENDPOINT_ENV).ok();
        Self::with_endpoints(region, dp.as_deref(), cp.as_deref())
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        Ok(Self::with_endpoints(
            &config.region,
            config.data_plane_endpoint.as_deref(),
            config.control_plane_endpoint.as_deref(),
        )?
        .with_polling(
            Duration::from_secs(config.polling_interval_seconds),
            Duration::from_secs(config.polling_timeout_seconds),
        ))
    }

    fn with_endpoints(
        region: &str,
        data_plane: Option<&str>,
        control_plane: Option<&str>,
    ) -> Result<Self, IdentityError> {
        ensure_region(region)?;
        let endpoints = IdentityEndpoints::resolve(region, data_plane, control_plane)?;
        let api = HttpIdentityApi::new(region, endpoints)?;
        Self::with_api(region, Arc::new(api))
    }

    /// Client over an arbitrary transport.
    pub fn with_api(region: &str, api: Arc<dyn IdentityApi>) -> Result<Self, IdentityError> {
        ensure_region(region)?;
        Ok(Self {
            region: region.to_string(),
            api,
            token_manager: TokenManager::new(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            polling_timeout: DEFAULT_POLLING_TIMEOUT,
        })
    }

    /// Timing of the default poller used by [`IdentityClient::get_token`].
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.polling_interval = interval;
        self.polling_timeout = timeout;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of vended credentials currently tracked.
    pub fn tracked_token_count(&self) -> usize {
        self.token_manager.active_count()
    }

    pub async fn create_oauth2_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        info!("Creating OAuth2 credential provider...");
        self.api.create_oauth2_credential_provider(req).await
    }

    pub async fn create_api_key_credential_provider(&self, req: &Value) -> Result<Value, IdentityError> {
        info!("Creating API key credential provider...");
        self.api.create_api_key_credential_provider(req).await
    }

    /// Workload access token for `workload_name`, optionally on behalf of a
    /// user identified by a JWT (`user_token`) or an id (`user_id`). The JWT
    /// wins when both are given.
    pub async fn get_workload_access_token(
        &self,
        workload_name: &str,
        user_token: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
        if !SecurityValidator::validate_workload_name(workload_name) {
            return Err(IdentityError::InvalidInput(format!(
                "Invalid workload name format: {}",
                SecurityValidator::sanitize_log_data(workload_name)
            )));
        }

        let user_token = user_token.filter(|t| !t.is_empty());
        let mut resp = match (user_token, user_id.filter(|u| !u.is_empty())) {
            (Some(token), _) => {
                if user_id.is_some() {
                    warn!("Both user token and user id are supplied, using user token");
                }
                info!("Getting workload access token for JWT...");
                self.api
                    .get_workload_access_token_for_jwt(&GetWorkloadAccessTokenForJwtRequest {
                        workload_name: workload_name.to_string(),
                        user_token: token.to_string(),
                    })
                    .await?
            }
            (None, Some(id)) => {
                if id.trim().is_empty() {
                    return Err(IdentityError::InvalidInput("User ID cannot be empty".to_string()));
                }
                info!("Getting workload access token for user id...");
                self.api
                    .get_workload_access_token_for_user_id(&GetWorkloadAccessTokenForUserIdRequest {
                        workload_name: workload_name.to_string(),
                        user_id: id.to_string(),
                    })
                    .await?
            }
            (None, None) => {
                info!("Getting workload access token...");
                self.api
                    .get_workload_access_token(&GetWorkloadAccessTokenRequest {
                        workload_name: workload_name.to_string(),
                    })
                    .await?
            }
        };

        if resp.workload_access_token.is_some() {
            let token_id = format!("workload_{}_{}", workload_name, short_hex());
            self.token_manager.register_token(token_id.clone());
            resp.token_id = Some(token_id);
        }

        info!("Successfully retrieved workload access token");
        Ok(resp)
    }

    /// Create a workload identity, named `workload-<8 hex>` unless `name` is given.
    pub async fn create_workload_identity(&self, name: Option<&str>) -> Result<WorkloadIdentity, IdentityError> {
        info!("Creating workload identity...");
        let name = match name.filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("workload-{}", short_hex()),
        };

        if !SecurityValidator::validate_workload_name(&name) {
            return Err(IdentityError::InvalidInput(format!(
                "Invalid workload identity name format: {}",
                SecurityValidator::sanitize_log_data(&name)
            )));
        }

        self.api
            .create_workload_identity(&CreateWorkloadIdentityRequest { name })
            .await
    }

    /// OAuth2 access token from a credential provider.
    ///
    /// When the provider needs user consent the service answers with an
    /// authorization URL instead of a token: `on_auth_url` is told about it
    /// and `token_poller` (or the default poller) waits for the token.
    pub async fn get_token(
        &self,
        request: GetTokenRequest,
        on_auth_url: Option<AuthUrlCallback<'_>>,
        token_poller: Option<&dyn TokenPoller>,
    ) -> Result<String, IdentityError> {
        ensure_present(&request.provider_name, "Provider name")?;
        ensure_present(&request.agent_identity_token, "Agent identity token")?;

        info!(
            "{}",
            SecurityValidator::sanitize_log_data(&format!(
                "Getting OAuth2 token for provider: {}",
                request.provider_name
            ))
        );

        let mut req = GetResourceOauth2TokenRequest {
            resource_credential_provider_name: request.provider_name.clone(),
            scopes: request.scopes,
            oauth2_flow: request.auth_flow,
            workload_identity_token: request.agent_identity_token,
            callback_url: request.callback_url.filter(|u| !u.is_empty()),
            force_authentication: request.force_authentication.then_some(true),
        };

        let response = self.api.get_resource_oauth2_token(&req).await?;

        if let Some(token) = response.access_token {
            self.token_manager
                .register_token(format!("oauth_{}_{}", request.provider_name, short_hex()));
            return Ok(token);
        }

        let Some(auth_url) = response.authorization_url else {
            return Err(IdentityError::NoTokenOrAuthorizationUrl);
        };

        if let Some(notify) = on_auth_url {
            notify(&auth_url);
        }

        // Only the initial request forces re-authentication.
        if req.force_authentication.is_some() {
            req.force_authentication = Some(false);
        }

        match token_poller {
            Some(poller) => poller.poll_for_token().await,
            None => {
                DefaultApiTokenPoller::new(auth_url, self.api.clone(), req)
                    .with_timing(self.polling_interval, self.polling_timeout)
                    .poll_for_token()
                    .await
            }
        }
    }

    pub async fn get_api_key(&self, provider_name: &str, agent_identity_token: &str) -> Result<String, IdentityError> {
        ensure_present(provider_name, "Provider name")?;
        ensure_present(agent_identity_token, "Agent identity token")?;

        info!(
            "{}",
            SecurityValidator::sanitize_log_data(&format!("Getting API key for provider: {}", provider_name))
        );

        let response = self
            .api
            .get_resource_api_key(&GetResourceApiKeyRequest {
                resource_credential_provider_name: provider_name.to_string(),
                workload_identity_token: agent_identity_token.to_string(),
            })
            .await?;

        self.token_manager
            .register_token(format!("apikey_{}_{}", provider_name, short_hex()));
        Ok(response.api_key)
    }

    /// Forget every tracked credential, returning how many there were.
    pub fn cleanup_tokens(&self) -> usize {
        info!("Cleaning up {} tracked tokens", self.token_manager.active_count());
        self.token_manager.cleanup_all()
    }
}

fn ensure_region(region: &str) -> Result<(), IdentityError> {
    if region.trim().is_empty() {
        return Err(IdentityError::InvalidInput("Region cannot be empty".to_string()));
    }
    Ok(())
}

fn ensure_present(value: &str, what: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        return Err(IdentityError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(())
}

fn short_hex() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
