// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub use agentcore_core::domain::ping::{PingResponse, PingStatus};
use serde_json::Value;
use thiserror::Error;

/// Body of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResponse {
    /// The agent answered with a single JSON document
    Json(Value),
    /// The agent streamed server-sent events; one value per `data:` event
    Events(Vec<Value>),
}

impl InvocationResponse {
    /// Every value in the response, in order.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            InvocationResponse::Json(v) => vec![v],
            InvocationResponse::Events(events) => events,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-success status; `message` is the server's `error` field when present
    #[error("Runtime returned {status}: {message}")]
    Server { status: u16, message: String },
}
