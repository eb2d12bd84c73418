// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::identity::IdentityError;
use url::{Host, Url};

/// Resolved service endpoints for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoints {
    pub data_plane: Url,
    pub control_plane: Url,
}

impl IdentityEndpoints {
    /// Default endpoints for `region`, replaced by any override given.
    /// Overrides are validated before use.
    pub fn resolve(
        region: &str,
        data_plane_override: Option<&str>,
        control_plane_override: Option<&str>,
    ) -> Result<Self, IdentityError> {
        Ok(Self {
            data_plane: data_plane_endpoint(region, data_plane_override)?,
            control_plane: control_plane_endpoint(region, control_plane_override)?,
        })
    }
}

pub fn data_plane_endpoint(region: &str, override_url: Option<&str>) -> Result<Url, IdentityError> {
    endpoint("bedrock-agentcore", region, override_url)
}

pub fn control_plane_endpoint(region: &str, override_url: Option<&str>) -> Result<Url, IdentityError> {
    endpoint("bedrock-agentcore-control", region, override_url)
}

fn endpoint(prefix: &str, region: &str, override_url: Option<&str>) -> Result<Url, IdentityError> {
    if !is_valid_region(region) {
        return Err(IdentityError::InvalidInput(format!("Invalid region format: {}", region)));
    }

    match override_url.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => validate_override(raw),
        None => Url::parse(&format!("https://{}.{}.amazonaws.com", prefix, region))
            .map_err(|e| IdentityError::InvalidEndpoint(e.to_string())),
    }
}

/// AWS region names: lowercase words joined by dashes, ending in a number
/// (`us-west-2`, `us-gov-west-1`, `ap-southeast-3`).
pub fn is_valid_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
        return false;
    }
    let Some((last, words)) = parts.split_last() else {
        return false;
    };
    last.chars().all(|c| c.is_ascii_digit())
        && words[0].len() == 2
        && words
            .iter()
            .all(|w| w.chars().all(|c| c.is_ascii_lowercase()))
}

fn validate_override(raw: &str) -> Result<Url, IdentityError> {
    let url = Url::parse(raw).map_err(|e| IdentityError::InvalidEndpoint(format!("{}: {}", raw, e)))?;

    let host = url
        .host()
        .ok_or_else(|| IdentityError::InvalidEndpoint(format!("{}: missing host", raw)))?;

    match url.scheme() {
        "https" => {}
        "http" if is_loopback(&host) => {}
        scheme => {
            return Err(IdentityError::InvalidEndpoint(format!(
                "{}: scheme '{}' not allowed, use https",
                raw, scheme
            )))
        }
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(IdentityError::InvalidEndpoint(format!("{}: credentials in URL", raw)));
    }
    Ok(url)
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(d) => d.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = IdentityEndpoints::resolve("us-west-2", None, None).unwrap();
        assert_eq!(
            endpoints.data_plane.as_str(),
            "https://bedrock-agentcore.us-west-2.amazonaws.com/"
        );
        assert_eq!(
            endpoints.control_plane.as_str(),
            "https://bedrock-agentcore-control.us-west-2.amazonaws.com/"
        );
    }

    #[test]
    fn test_region_validation() {
        assert!(is_valid_region("us-east-1"));
        assert!(is_valid_region("us-gov-west-1"));
        assert!(is_valid_region("ap-southeast-3"));
        assert!(!is_valid_region(""));
        assert!(!is_valid_region("us-east"));
        assert!(!is_valid_region("US-EAST-1"));
        assert!(!is_valid_region("us-east-1.evil.com"));
        assert!(!is_valid_region("us--1"));
        assert!(data_plane_endpoint("evil.com/x", None).is_err());
    }

    #[test]
    fn test_override_must_be_https() {
        let url = data_plane_endpoint("us-east-1", Some("https://vpce.example.com")).unwrap();
        assert_eq!(url.host_str(), Some("vpce.example.com"));

        assert!(data_plane_endpoint("us-east-1", Some("http://example.com")).is_err());
        assert!(data_plane_endpoint("us-east-1", Some("ftp://example.com")).is_err());
        assert!(data_plane_endpoint("us-east-1", Some("not a url")).is_err());
        assert!(data_plane_endpoint("us-east-1", Some("https://user:pw@example.com")).is_err());
    }

    #[test]
    fn test_http_allowed_for_loopback() {
        assert!(control_plane_endpoint("us-east-1", Some("http://localhost:4566")).is_ok());
        assert!(control_plane_endpoint("us-east-1", Some("http://127.0.0.1:8080")).is_ok());
        assert!(control_plane_endpoint("us-east-1", Some("http://[::1]:8080")).is_ok());
    }

    #[test]
    fn test_blank_override_uses_default() {
        let url = data_plane_endpoint("eu-west-1", Some("  ")).unwrap();
        assert_eq!(url.host_str(), Some("bedrock-agentcore.eu-west-1.amazonaws.com"));
    }
}
