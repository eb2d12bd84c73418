// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identity commands
//!
//! Commands: create-workload-identity, get-workload-token, get-token, get-api-key

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use agentcore_core::domain::config::AgentCoreConfig;
use agentcore_core::domain::identity::{AuthFlow, GetTokenRequest};
use agentcore_core::IdentityClient;

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// Create a workload identity
    CreateWorkloadIdentity {
        /// Identity name (default: generated)
        #[arg(long)]
        name: Option<String>,
    },

    /// Get a workload access token
    GetWorkloadToken {
        /// Workload identity name
        #[arg(value_name = "WORKLOAD")]
        workload_name: String,

        /// JWT of the user the agent acts for
        #[arg(long)]
        user_token: Option<String>,

        /// Id of the user the agent acts for
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Get an OAuth2 access token from a credential provider
    GetToken {
        /// Credential provider name
        #[arg(long)]
        provider: String,

        /// Workload access token of the agent
        #[arg(long, env = "BEDROCK_AGENTCORE_WORKLOAD_TOKEN", hide_env_values = true)]
        agent_identity_token: String,

        /// M2M or USER_FEDERATION
        #[arg(long, default_value = "M2M")]
        auth_flow: AuthFlow,

        /// OAuth2 scope (repeatable)
        #[arg(long = "scope", value_name = "SCOPE")]
        scopes: Vec<String>,

        /// Pre-registered OAuth2 callback URL
        #[arg(long)]
        callback_url: Option<String>,

        /// Re-authenticate even if a token is already vaulted
        #[arg(long)]
        force_authentication: bool,
    },

    /// Get an API key from a credential provider
    GetApiKey {
        /// Credential provider name
        #[arg(long)]
        provider: String,

        /// Workload access token of the agent
        #[arg(long, env = "BEDROCK_AGENTCORE_WORKLOAD_TOKEN", hide_env_values = true)]
        agent_identity_token: String,
    },
}

pub async fn handle_command(
    command: IdentityCommand,
    config_override: Option<PathBuf>,
    region: Option<String>,
) -> Result<()> {
    let client = build_client(config_override, region)?;

    match command {
        IdentityCommand::CreateWorkloadIdentity { name } => {
            let identity = client
                .create_workload_identity(name.as_deref())
                .await
                .context("Failed to create workload identity")?;
            println!("{}", format!("✓ Workload identity created: {}", identity.name).green());
            if let Some(arn) = &identity.workload_identity_arn {
                println!("  ARN: {}", arn);
            }
        }
        IdentityCommand::GetWorkloadToken {
            workload_name,
            user_token,
            user_id,
        } => {
            let resp = client
                .get_workload_access_token(&workload_name, user_token.as_deref(), user_id.as_deref())
                .await
                .context("Failed to get workload access token")?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        IdentityCommand::GetToken {
            provider,
            agent_identity_token,
            auth_flow,
            scopes,
            callback_url,
            force_authentication,
        } => {
            let mut request = GetTokenRequest::new(provider, agent_identity_token, auth_flow)
                .with_force_authentication(force_authentication);
            if !scopes.is_empty() {
                request = request.with_scopes(scopes);
            }
            if let Some(url) = callback_url {
                request = request.with_callback_url(url);
            }

            let on_auth_url = |url: &str| {
                eprintln!("{}", "Authorization required. Open this URL to continue:".yellow());
                eprintln!("  {}", url);
            };
            let token = client
                .get_token(request, Some(&on_auth_url), None)
                .await
                .context("Failed to get OAuth2 token")?;
            println!("{}", token);
        }
        IdentityCommand::GetApiKey {
            provider,
            agent_identity_token,
        } => {
            let key = client
                .get_api_key(&provider, &agent_identity_token)
                .await
                .context("Failed to get API key")?;
            println!("{}", key);
        }
    }

    client.cleanup_tokens();
    Ok(())
}

fn build_client(config_override: Option<PathBuf>, region: Option<String>) -> Result<IdentityClient> {
    let config = AgentCoreConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;

    let mut identity = config.spec.identity;
    if let Some(region) = region {
        identity.region = region;
    }
    info!("Using Identity service in {}", identity.region);

    IdentityClient::from_config(&identity).context("Failed to create identity client")
}
