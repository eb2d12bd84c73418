// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request context
//!
//! Per-invocation data lifted from the runtime request headers, plus a
//! task-scoped slot holding the workload access token so that identity calls
//! made deep inside agent code can find it without threading it through.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Header carrying the runtime session identifier.
pub const SESSION_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Header carrying the workload access token minted by the platform.
pub const ACCESS_TOKEN_HEADER: &str = "WorkloadAccessToken";

tokio::task_local! {
    static WORKLOAD_ACCESS_TOKEN: Option<String>;
}

/// Context handed to the entrypoint alongside the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub session_id: Option<String>,
    pub request_id: String,
    #[serde(skip_serializing)]
    pub workload_access_token: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    /// Build a context from request headers. Header lookup is case-insensitive
    /// and empty or non UTF-8 values are treated as absent.
    pub fn from_headers(request_id: impl Into<String>, headers: &HeaderMap) -> Self {
        Self {
            session_id: header_value(headers, SESSION_HEADER),
            request_id: request_id.into(),
            workload_access_token: header_value(headers, ACCESS_TOKEN_HEADER),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    match headers.get(name).map(|v| v.to_str()) {
        Some(Ok(v)) if !v.is_empty() => Some(v.to_string()),
        Some(Err(e)) => {
            tracing::warn!("Ignoring malformed {} header: {}", name, e);
            None
        }
        _ => None,
    }
}

/// Accessor for values scoped to the invocation currently being handled.
pub struct AgentCoreContext;

impl AgentCoreContext {
    /// Workload access token of the current invocation, if the platform sent one.
    pub fn workload_access_token() -> Option<String> {
        WORKLOAD_ACCESS_TOKEN
            .try_with(|token| token.clone())
            .ok()
            .flatten()
    }

    /// Run `fut` with `token` visible through [`AgentCoreContext::workload_access_token`].
    pub async fn scope<F: Future>(token: Option<String>, fut: F) -> F::Output {
        WORKLOAD_ACCESS_TOKEN.scope(token, fut).await
    }

    /// Blocking counterpart of [`AgentCoreContext::scope`], used on the blocking pool.
    pub fn sync_scope<R>(token: Option<String>, f: impl FnOnce() -> R) -> R {
        WORKLOAD_ACCESS_TOKEN.sync_scope(token, f)
    }
}
