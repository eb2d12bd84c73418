// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Invocation
//!
//! What an entrypoint hands back to the runtime, and the ways an invocation
//! can fail before or while the entrypoint runs.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Entrypoint results, streaming chunks and invocation errors

use futures::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Payload key that carries a debug action when the app runs in debug mode.
pub const DEBUG_ACTION_KEY: &str = "_agent_core_app_action";

/// Message sent with the terminal error event of a failed stream.
pub const STREAM_ERROR_MESSAGE: &str = "An error occurred during streaming";

/// Failure raised by agent code.
///
/// `kind` names the failure class and is surfaced as `error_type` in
/// streaming error events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    kind: String,
    message: String,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Convenience for the common case where no particular kind applies.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Terminal event emitted in place of a stream error.
    pub fn to_stream_event(&self) -> Value {
        json!({
            "error": self.message,
            "error_type": self.kind,
            "message": STREAM_ERROR_MESSAGE,
        })
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::msg(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new("SerializationError", err.to_string())
    }
}

/// One event of a streamed response, already converted to JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk(Value);

impl StreamChunk {
    /// Serialize `value` into a chunk. A value that cannot be represented as
    /// JSON becomes an error description instead of failing the stream.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self(v),
            Err(e) => {
                let original_type = std::any::type_name::<T>();
                tracing::warn!("Failed to serialize stream chunk of type {}: {}", original_type, e);
                Self(json!({
                    "error": "Serialization failed",
                    "original_type": original_type,
                }))
            }
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for StreamChunk {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk, HandlerError>>;

/// Result of running an entrypoint.
pub enum Invocation {
    /// Single JSON document returned as the response body
    Json(Value),
    /// Server-sent events, one per chunk
    Stream(ChunkStream),
}

impl Invocation {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, HandlerError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Wrap a stream of serializable items as a streaming response.
    pub fn stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, HandlerError>> + Send + 'static,
        T: Serialize + 'static,
    {
        Self::Stream(
            stream
                .map(|item| item.map(|v| StreamChunk::from_serialize(&v)))
                .boxed(),
        )
    }

    /// Stream built from an iterator, the counterpart of a synchronous generator.
    pub fn iter<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<T, HandlerError>>,
        I::IntoIter: Send + 'static,
        T: Serialize + 'static,
    {
        Self::stream(futures::stream::iter(items))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Invocation::Stream(_))
    }
}

impl From<Value> for Invocation {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Invocation::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Debug actions understood by an app started in debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugAction {
    PingStatus,
    JobStatus,
    ForceHealthy,
    ForceBusy,
    ClearForcedStatus,
}

impl DebugAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "ping_status" => Some(Self::PingStatus),
            "job_status" => Some(Self::JobStatus),
            "force_healthy" => Some(Self::ForceHealthy),
            "force_busy" => Some(Self::ForceBusy),
            "clear_forced_status" => Some(Self::ClearForcedStatus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PingStatus => "ping_status",
            Self::JobStatus => "job_status",
            Self::ForceHealthy => "force_healthy",
            Self::ForceBusy => "force_busy",
            Self::ClearForcedStatus => "clear_forced_status",
        }
    }

    /// Extract the raw debug action requested by `payload`, if any.
    ///
    /// Any non-empty value counts as a request. Strings are returned as is,
    /// other values as their JSON text so they can be reported back.
    pub fn requested(payload: &Value) -> Option<String> {
        match payload.get(DEBUG_ACTION_KEY)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// Ways an invocation request fails. Each maps to one HTTP status.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("No entrypoint defined")]
    NoEntrypoint,

    #[error("Server busy - maximum concurrent requests reached")]
    ServerBusy,

    #[error(transparent)]
    Handler(#[from] HandlerError),
}
