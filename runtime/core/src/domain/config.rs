// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Runtime Configuration Types
//
// Defines the configuration manifest for an AgentCore runtime host:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server settings (bind address, concurrency, debug actions)
// - Identity service settings (region, endpoint overrides, OAuth2 polling)
// - Logging settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "agentcore.aws/v1";
pub const KIND: &str = "AgentCoreConfig";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "BEDROCK_AGENTCORE_CONFIG_PATH";
pub const DATA_PLANE_ENDPOINT_ENV: &str = "BEDROCK_AGENTCORE_DP_ENDPOINT";
pub const CONTROL_PLANE_ENDPOINT_ENV: &str = "BEDROCK_AGENTCORE_CP_ENDPOINT";
pub const DEBUG_ENV: &str = "BEDROCK_AGENTCORE_DEBUG";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCoreConfig {
    /// API version (must be "agentcore.aws/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "AgentCoreConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: AgentCoreSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Human-readable agent name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCoreSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address; auto-detected (container vs. local) when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Invocations allowed to run at once before answering 503
    #[serde(default = "default_max_concurrent_invocations")]
    pub max_concurrent_invocations: usize,

    /// Accept `_agent_core_app_action` debug actions on /invocations
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Data plane endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_plane_endpoint: Option<String>,

    /// Control plane endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<String>,

    /// Seconds between OAuth2 token polls
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,

    /// Seconds before OAuth2 polling gives up
    #[serde(default = "default_polling_timeout")]
    pub polling_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_max_concurrent_invocations() -> usize {
    2
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_polling_interval() -> u64 {
    5
}

fn default_polling_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            max_concurrent_invocations: default_max_concurrent_invocations(),
            debug: false,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            data_plane_endpoint: None,
            control_plane_endpoint: None,
            polling_interval_seconds: default_polling_interval(),
            polling_timeout_seconds: default_polling_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AgentCoreConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "agent".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: AgentCoreSpec::default(),
        }
    }
}

impl AgentCoreConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. BEDROCK_AGENTCORE_CONFIG_PATH environment variable
    /// 2. ./agentcore-config.yaml (working directory)
    /// 3. ~/.agentcore/config.yaml (user home)
    /// 4. /etc/agentcore/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Candidate locations in discovery order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./agentcore-config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".agentcore").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/agentcore/config.yaml"));
        paths
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::debug!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`AgentCoreConfig::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let region = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION"));
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            self.spec.identity.region = region;
        }

        if let Some(endpoint) = lookup(DATA_PLANE_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: {}={}", DATA_PLANE_ENDPOINT_ENV, endpoint);
            self.spec.identity.data_plane_endpoint = Some(endpoint);
        }

        if let Some(endpoint) = lookup(CONTROL_PLANE_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: {}={}", CONTROL_PLANE_ENDPOINT_ENV, endpoint);
            self.spec.identity.control_plane_endpoint = Some(endpoint);
        }

        if let Some(val) = lookup(DEBUG_ENV) {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.spec.server.debug = true,
                "false" | "0" | "no" | "off" => self.spec.server.debug = false,
                _ => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        DEBUG_ENV,
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let server = &self.spec.server;
        if server.port == 0 {
            anyhow::bail!("spec.server.port must be greater than 0");
        }
        if server.max_concurrent_invocations == 0 {
            anyhow::bail!("spec.server.max_concurrent_invocations must be at least 1");
        }

        let identity = &self.spec.identity;
        if identity.region.is_empty() {
            anyhow::bail!("spec.identity.region cannot be empty");
        }
        if identity.polling_interval_seconds == 0 {
            anyhow::bail!("spec.identity.polling_interval_seconds must be greater than 0");
        }
        if identity.polling_timeout_seconds < identity.polling_interval_seconds {
            anyhow::bail!(
                "spec.identity.polling_timeout_seconds ({}) is shorter than the polling interval ({})",
                identity.polling_timeout_seconds,
                identity.polling_interval_seconds
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AgentCoreConfig::default();
        assert_eq!(config.api_version, API_VERSION);
        assert_eq!(config.kind, KIND);
        assert_eq!(config.spec.server.port, 8080);
        assert_eq!(config.spec.server.max_concurrent_invocations, 2);
        assert_eq!(config.spec.identity.polling_interval_seconds, 5);
        assert_eq!(config.spec.identity.polling_timeout_seconds, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: agentcore.aws/v1
kind: AgentCoreConfig
metadata:
  name: weather-agent
spec:
  server:
    port: 9000
    debug: true
  identity:
    region: eu-central-1
"#;
        let config = AgentCoreConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.metadata.name, "weather-agent");
        assert_eq!(config.spec.server.port, 9000);
        assert!(config.spec.server.debug);
        assert_eq!(config.spec.server.max_concurrent_invocations, 2);
        assert_eq!(config.spec.identity.region, "eu-central-1");
        assert_eq!(config.spec.logging.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AWS_DEFAULT_REGION", "ap-southeast-2"),
            (DATA_PLANE_ENDPOINT_ENV, "https://dp.example.com"),
            (DEBUG_ENV, "yes"),
        ]);
        let mut config = AgentCoreConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.spec.identity.region, "ap-southeast-2");
        assert_eq!(
            config.spec.identity.data_plane_endpoint.as_deref(),
            Some("https://dp.example.com")
        );
        assert!(config.spec.identity.control_plane_endpoint.is_none());
        assert!(config.spec.server.debug);
    }

    #[test]
    fn test_invalid_debug_override_is_ignored() {
        let mut config = AgentCoreConfig::default();
        config.apply_overrides_from(|k| (k == DEBUG_ENV).then(|| "maybe".to_string()));
        assert!(!config.spec.server.debug);
    }

    #[test]
    fn test_validation() {
        let mut config = AgentCoreConfig::default();

        config.api_version = "wrong/v1".to_string();
        assert!(config.validate().is_err());
        config.api_version = API_VERSION.to_string();

        config.kind = "NodeConfig".to_string();
        assert!(config.validate().is_err());
        config.kind = KIND.to_string();

        config.spec.server.max_concurrent_invocations = 0;
        assert!(config.validate().is_err());
        config.spec.server.max_concurrent_invocations = 2;

        config.spec.identity.polling_timeout_seconds = 1;
        assert!(config.validate().is_err());
        config.spec.identity.polling_timeout_seconds = 600;

        config.spec.identity.polling_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentcore-config.yaml");

        let mut config = AgentCoreConfig::default();
        config.metadata.name = "file-agent".to_string();
        config.spec.server.host = Some("0.0.0.0".to_string());
        config.to_yaml_file(&path).unwrap();

        let loaded = AgentCoreConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "file-agent");
        assert_eq!(loaded.spec.server.host.as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let result = AgentCoreConfig::load_or_default(Some(PathBuf::from("/nonexistent/agentcore.yaml")));
        assert!(result.is_err());
    }
}
