// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::sse::{self, SseDecoder};
use crate::types::{ClientError, InvocationResponse, PingResponse};
use agentcore_core::domain::context::{ACCESS_TOKEN_HEADER, SESSION_HEADER};
use agentcore_core::domain::invocation::DEBUG_ACTION_KEY;
use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

const EVENT_STREAM: &str = "text/event-stream";

/// Client for an agent served on the AgentCore runtime contract.
#[derive(Debug, Clone)]
pub struct AgentCoreClient {
    base_url: String,
    client: Client,
    session_id: Option<String>,
    workload_access_token: Option<String>,
}

impl AgentCoreClient {
    /// Create a client for the runtime at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            session_id: None,
            workload_access_token: None,
        }
    }

    /// Send the runtime session header with every invocation.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Send a workload access token with every invocation.
    pub fn with_workload_access_token(mut self, token: impl Into<String>) -> Self {
        self.workload_access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current health of the runtime.
    pub async fn ping(&self) -> Result<PingResponse> {
        let url = format!("{}/ping", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        let response = check_status(response).await?;
        Ok(response.json().await.context("Invalid ping response")?)
    }

    /// Invoke the agent. A streamed answer is collected into
    /// [`InvocationResponse::Events`].
    pub async fn invoke(&self, payload: &Value) -> Result<InvocationResponse> {
        let response = self.send_invocation(payload).await?;

        if is_event_stream(&response) {
            let body = response.bytes().await.context("Failed to read event stream")?;
            return Ok(InvocationResponse::Events(sse::decode_all(&body)));
        }
        let value = response.json().await.context("Invalid invocation response")?;
        Ok(InvocationResponse::Json(value))
    }

    /// Invoke the agent and yield its events as they arrive. A plain JSON
    /// answer is yielded as a single item.
    pub async fn invoke_stream(&self, payload: &Value) -> Result<BoxStream<'static, Result<Value>>> {
        let response = self.send_invocation(payload).await?;

        if !is_event_stream(&response) {
            let value: Value = response.json().await.context("Invalid invocation response")?;
            return Ok(stream::once(async move { Ok(value) }).boxed());
        }

        let mut decoder = SseDecoder::new();
        let events = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder.push(&bytes).into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(anyhow::Error::new(e).context("Event stream interrupted"))],
            })
            .flat_map(stream::iter)
            .boxed();
        Ok(events)
    }

    /// Run a debug action; the runtime must be started in debug mode.
    pub async fn debug_action(&self, action: &str) -> Result<Value> {
        match self.invoke(&json!({ DEBUG_ACTION_KEY: action })).await? {
            InvocationResponse::Json(v) => Ok(v),
            InvocationResponse::Events(_) => anyhow::bail!("Unexpected streamed answer to debug action {}", action),
        }
    }

    fn with_headers(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(session_id) = &self.session_id {
            req = req.header(SESSION_HEADER, session_id);
        }
        if let Some(token) = &self.workload_access_token {
            req = req.header(ACCESS_TOKEN_HEADER, token);
        }
        req
    }

    async fn send_invocation(&self, payload: &Value) -> Result<Response> {
        let url = format!("{}/invocations", self.base_url);
        debug!("POST {}", url);
        let response = self
            .with_headers(self.client.post(&url).json(payload))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        check_status(response).await
    }
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(EVENT_STREAM))
}

/// Turn a non-success response into [`ClientError::Server`], preferring the
/// runtime's `error` field over the raw body.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PingStatus;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_ping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ping")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"HealthyBusy","time_of_last_update":1700000000}"#)
            .create_async()
            .await;

        let ping = AgentCoreClient::new(server.url()).ping().await.unwrap();
        assert_eq!(ping.status, PingStatus::HealthyBusy);
        assert_eq!(ping.time_of_last_update, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_invoke_sends_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invocations")
            .match_header("x-amzn-bedrock-agentcore-runtime-session-id", "s-1")
            .match_header("workloadaccesstoken", "tok")
            .match_body(Matcher::Json(json!({"prompt": "hi"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"hello"}"#)
            .create_async()
            .await;

        let client = AgentCoreClient::new(format!("{}/", server.url()))
            .with_session_id("s-1")
            .with_workload_access_token("tok");
        let resp = client.invoke(&json!({"prompt": "hi"})).await.unwrap();

        assert_eq!(resp, InvocationResponse::Json(json!({"answer": "hello"})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_collects_events() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: {\"n\":1}\n\ndata: {\"n\":2}\n\n")
            .create_async()
            .await;

        let resp = AgentCoreClient::new(server.url()).invoke(&json!({})).await.unwrap();
        assert_eq!(
            resp,
            InvocationResponse::Events(vec![json!({"n": 1}), json!({"n": 2})])
        );
    }

    #[tokio::test]
    async fn test_invoke_stream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("data: \"a\"\n\ndata: \"b\"\n\n")
            .create_async()
            .await;

        let events: Vec<Value> = AgentCoreClient::new(server.url())
            .invoke_stream(&json!({}))
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn test_server_error_surfaces_error_field() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invocations")
            .with_status(503)
            .with_body(r#"{"error":"Server busy - maximum concurrent requests reached"}"#)
            .create_async()
            .await;

        let err = AgentCoreClient::new(server.url())
            .invoke(&json!({}))
            .await
            .unwrap_err();
        match err.downcast_ref::<ClientError>() {
            Some(ClientError::Server { status, message }) => {
                assert_eq!(*status, 503);
                assert_eq!(message, "Server busy - maximum concurrent requests reached");
            }
            None => panic!("unexpected error: {:?}", err),
        }
    }

    #[tokio::test]
    async fn test_debug_action_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invocations")
            .match_body(Matcher::Json(json!({"_agent_core_app_action": "force_busy"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"forced_status":"HealthyBusy"}"#)
            .create_async()
            .await;

        let resp = AgentCoreClient::new(server.url())
            .debug_action("force_busy")
            .await
            .unwrap();
        assert_eq!(resp["forced_status"], "HealthyBusy");
        mock.assert_async().await;
    }
}
