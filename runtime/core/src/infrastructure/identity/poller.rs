// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::identity::{GetResourceOauth2TokenRequest, IdentityApi, IdentityError, TokenPoller};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLLING_TIMEOUT: Duration = Duration::from_secs(600);

/// Re-issues the OAuth2 token request until the user has completed the
/// authorization at `auth_url`, sleeping `interval` before each attempt.
pub struct DefaultApiTokenPoller {
    auth_url: String,
    api: Arc<dyn IdentityApi>,
    request: GetResourceOauth2TokenRequest,
    interval: Duration,
    timeout: Duration,
}

impl DefaultApiTokenPoller {
    pub fn new(
        auth_url: impl Into<String>,
        api: Arc<dyn IdentityApi>,
        request: GetResourceOauth2TokenRequest,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            api,
            request,
            interval: DEFAULT_POLLING_INTERVAL,
            timeout: DEFAULT_POLLING_TIMEOUT,
        }
    }

    pub fn with_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.interval = interval;
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TokenPoller for DefaultApiTokenPoller {
    async fn poll_for_token(&self) -> Result<String, IdentityError> {
        let start = Instant::now();
        while start.elapsed() < self.timeout {
            tokio::time::sleep(self.interval).await;

            info!("Polling for token for authorization url: {}", self.auth_url);
            let resp = self.api.get_resource_oauth2_token(&self.request).await?;
            if let Some(token) = resp.access_token {
                info!("Token is ready");
                return Ok(token);
            }
        }
        Err(IdentityError::PollingTimeout(self.timeout.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::*;
    use parking_lot::Mutex;
    use serde_json::Value;

    /// Answers oauth2 token requests from a script; every other call fails.
    struct ScriptedApi {
        responses: Mutex<Vec<Option<String>>>,
        calls: Mutex<Vec<GetResourceOauth2TokenRequest>>,
    }

    impl ScriptedApi {
        fn new(mut responses: Vec<Option<String>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    fn unused<T>() -> Result<T, IdentityError> {
        Err(IdentityError::Transport("not scripted".to_string()))
    }

    #[async_trait]
    impl IdentityApi for ScriptedApi {
        async fn get_workload_access_token(
            &self,
            _req: &GetWorkloadAccessTokenRequest,
        ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
            unused()
        }
        async fn get_workload_access_token_for_jwt(
            &self,
            _req: &GetWorkloadAccessTokenForJwtRequest,
        ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
            unused()
        }
        async fn get_workload_access_token_for_user_id(
            &self,
            _req: &GetWorkloadAccessTokenForUserIdRequest,
        ) -> Result<WorkloadAccessTokenResponse, IdentityError> {
            unused()
        }
        async fn get_resource_oauth2_token(
            &self,
            req: &GetResourceOauth2TokenRequest,
        ) -> Result<GetResourceOauth2TokenResponse, IdentityError> {
            self.calls.lock().push(req.clone());
            let access_token = self.responses.lock().pop().flatten();
            Ok(GetResourceOauth2TokenResponse {
                access_token,
                authorization_url: None,
            })
        }
        async fn get_resource_api_key(
            &self,
            _req: &GetResourceApiKeyRequest,
        ) -> Result<GetResourceApiKeyResponse, IdentityError> {
            unused()
        }
        async fn create_workload_identity(
            &self,
            _req: &CreateWorkloadIdentityRequest,
        ) -> Result<WorkloadIdentity, IdentityError> {
            unused()
        }
        async fn create_oauth2_credential_provider(&self, _req: &Value) -> Result<Value, IdentityError> {
            unused()
        }
        async fn create_api_key_credential_provider(&self, _req: &Value) -> Result<Value, IdentityError> {
            unused()
        }
    }

    fn request() -> GetResourceOauth2TokenRequest {
        GetResourceOauth2TokenRequest {
            resource_credential_provider_name: "github".to_string(),
            scopes: None,
            oauth2_flow: AuthFlow::UserFederation,
            workload_identity_token: "wit".to_string(),
            callback_url: None,
            force_authentication: Some(false),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_token_once_ready() {
        let api = Arc::new(ScriptedApi::new(vec![None, None, Some("tok".to_string())]));
        let poller = DefaultApiTokenPoller::new("https://auth", api.clone(), request());

        let start = Instant::now();
        let token = poller.poll_for_token().await.unwrap();

        assert_eq!(token, "tok");
        assert_eq!(api.calls.lock().len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let poller = DefaultApiTokenPoller::new("https://auth", api.clone(), request());

        let err = poller.poll_for_token().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Polling timed out after 600 seconds. User may not have completed authorization."
        );
        assert_eq!(api.calls.lock().len(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timing() {
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let poller = DefaultApiTokenPoller::new("https://auth", api.clone(), request())
            .with_timing(Duration::from_secs(1), Duration::from_secs(3));

        assert!(matches!(
            poller.poll_for_token().await,
            Err(IdentityError::PollingTimeout(3))
        ));
        assert_eq!(api.calls.lock().len(), 3);
    }
}
