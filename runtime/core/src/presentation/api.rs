// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Runtime HTTP contract
//!
//! `POST /invocations` runs the entrypoint and answers with JSON or a
//! server-sent event stream; `GET /ping` reports health.

use crate::application::app::AgentCoreApp;
use crate::domain::context::RequestContext;
use crate::domain::invocation::{ChunkStream, Invocation, InvocationError};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{future, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub fn router(app: Arc<AgentCoreApp>) -> Router {
    Router::new()
        .route("/invocations", post(invocations_handler))
        .route("/ping", get(ping_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Short id tying together every log line of one request.
fn new_request_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

async fn invocations_handler(
    State(app): State<Arc<AgentCoreApp>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = new_request_id();
    let span = info_span!("invocation", request_id = %request_id);
    handle_invocation(app, headers, body, request_id)
        .instrument(span)
        .await
}

async fn handle_invocation(
    app: Arc<AgentCoreApp>,
    headers: HeaderMap,
    body: Bytes,
    request_id: String,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid JSON in request: {}", e);
            return InvocationError::InvalidJson(e.to_string()).into_response();
        }
    };

    let ctx = RequestContext::from_headers(request_id, &headers);
    info!("Invocation request received");

    match app.invoke(payload, ctx).await {
        Ok(Invocation::Json(value)) => Json(value).into_response(),
        Ok(Invocation::Stream(chunks)) => stream_response(chunks),
        Err(e) => e.into_response(),
    }
}

/// One `data:` event per chunk. A failing chunk ends the stream with an
/// error event instead of breaking the connection.
fn stream_response(chunks: ChunkStream) -> Response {
    let events = chunks.scan(false, |finished, item| {
        if *finished {
            return future::ready(None);
        }
        let value = match item {
            Ok(chunk) => chunk.into_value(),
            Err(e) => {
                error!("Error in streaming: {}: {}", e.kind(), e);
                *finished = true;
                e.to_stream_event()
            }
        };
        future::ready(Some(Ok::<_, Infallible>(Event::default().data(value.to_string()))))
    });
    Sse::new(events).into_response()
}

async fn ping_handler(State(app): State<Arc<AgentCoreApp>>) -> impl IntoResponse {
    Json(app.ping_response())
}

impl IntoResponse for InvocationError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            InvocationError::InvalidJson(details) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Invalid JSON", "details": details}),
            ),
            InvocationError::UnknownAction(_) => {
                (StatusCode::BAD_REQUEST, json!({"error": self.to_string()}))
            }
            InvocationError::NoEntrypoint => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": self.to_string()}))
            }
            InvocationError::ServerBusy => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({"error": self.to_string()}))
            }
            InvocationError::Handler(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": e.message()}))
            }
        };
        (status, Json(body)).into_response()
    }
}
