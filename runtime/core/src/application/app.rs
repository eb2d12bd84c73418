// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent application
//!
//! [`AgentCoreApp`] owns the registered entrypoint and everything the runtime
//! contract needs around it: the concurrency gate, ping status computation,
//! async task tracking and the debug actions. The HTTP surface in
//! `crate::presentation` only translates requests into calls on this type.
//!
//! ```no_run
//! use agentcore_core::{AgentCoreApp, Invocation};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let app = AgentCoreApp::builder()
//!     .entrypoint(|payload, ctx| async move {
//!         Ok(Invocation::Json(json!({"echo": payload, "session": ctx.session_id})))
//!     })
//!     .build();
//! app.run(8080, None).await
//! # }
//! ```

use crate::application::task_tracker::AsyncTaskTracker;
use crate::domain::context::{AgentCoreContext, RequestContext};
use crate::domain::invocation::{DebugAction, HandlerError, Invocation, InvocationError};
use crate::domain::ping::{PingResponse, PingStatus};
use crate::domain::task::{AsyncTaskInfo, TaskId};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use metrics::{counter, describe_counter};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Once};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Invocations allowed in flight when not configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_INVOCATIONS: usize = 2;

type AsyncHandler =
    Arc<dyn Fn(Value, RequestContext) -> BoxFuture<'static, Result<Invocation, HandlerError>> + Send + Sync>;
type BlockingHandler =
    Arc<dyn Fn(Value, RequestContext) -> Result<Invocation, HandlerError> + Send + Sync>;
type PingHandler = Arc<dyn Fn() -> Result<PingStatus, HandlerError> + Send + Sync>;

#[derive(Clone)]
enum Entrypoint {
    /// Runs on the async runtime
    Async(AsyncHandler),
    /// Runs on the blocking thread pool
    Blocking(BlockingHandler),
}

struct StatusState {
    forced: Option<PingStatus>,
    last_known: Option<PingStatus>,
    last_update: i64,
}

pub struct AgentCoreAppBuilder {
    entrypoint: Option<Entrypoint>,
    ping_handler: Option<PingHandler>,
    debug: bool,
    max_concurrent_invocations: usize,
}

impl AgentCoreAppBuilder {
    fn new() -> Self {
        Self {
            entrypoint: None,
            ping_handler: None,
            debug: false,
            max_concurrent_invocations: DEFAULT_MAX_CONCURRENT_INVOCATIONS,
        }
    }

    /// Register the async entrypoint invoked for every `POST /invocations`.
    pub fn entrypoint<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Invocation, HandlerError>> + Send + 'static,
    {
        self.entrypoint = Some(Entrypoint::Async(Arc::new(move |payload, ctx| {
            handler(payload, ctx).boxed()
        })));
        self
    }

    /// Register a synchronous entrypoint; it runs on the blocking pool so it
    /// never stalls the server.
    pub fn blocking_entrypoint<F>(mut self, handler: F) -> Self
    where
        F: Fn(Value, RequestContext) -> Result<Invocation, HandlerError> + Send + Sync + 'static,
    {
        self.entrypoint = Some(Entrypoint::Blocking(Arc::new(handler)));
        self
    }

    /// Register a custom ping status handler. Errors fall back to automatic status.
    pub fn ping<F>(mut self, handler: F) -> Self
    where
        F: Fn() -> Result<PingStatus, HandlerError> + Send + Sync + 'static,
    {
        self.ping_handler = Some(Arc::new(handler));
        self
    }

    /// Enable the `_agent_core_app_action` debug actions.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn max_concurrent_invocations(mut self, max: usize) -> Self {
        self.max_concurrent_invocations = max.max(1);
        self
    }

    pub fn build(self) -> AgentCoreApp {
        describe_app_metrics();
        AgentCoreApp {
            entrypoint: self.entrypoint,
            ping_handler: self.ping_handler,
            debug: self.debug,
            max_concurrent_invocations: self.max_concurrent_invocations,
            invocation_permits: Arc::new(Semaphore::new(self.max_concurrent_invocations)),
            tasks: AsyncTaskTracker::new(),
            status: Mutex::new(StatusState {
                forced: None,
                last_known: None,
                last_update: Utc::now().timestamp(),
            }),
        }
    }
}

/// An agent hosted behind the AgentCore runtime contract.
pub struct AgentCoreApp {
    entrypoint: Option<Entrypoint>,
    ping_handler: Option<PingHandler>,
    debug: bool,
    max_concurrent_invocations: usize,
    invocation_permits: Arc<Semaphore>,
    tasks: AsyncTaskTracker,
    status: Mutex<StatusState>,
}

impl AgentCoreApp {
    pub fn builder() -> AgentCoreAppBuilder {
        AgentCoreAppBuilder::new()
    }

    pub fn has_entrypoint(&self) -> bool {
        self.entrypoint.is_some()
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn max_concurrent_invocations(&self) -> usize {
        self.max_concurrent_invocations
    }

    /// Permits not currently held by a running invocation.
    pub fn available_invocation_slots(&self) -> usize {
        self.invocation_permits.available_permits()
    }

    /// Current status: forced > custom handler > automatic.
    pub fn current_ping_status(&self) -> PingStatus {
        let forced = self.status.lock().forced;

        let status = forced
            .or_else(|| self.custom_ping_status())
            .unwrap_or_else(|| {
                if self.tasks.is_busy() {
                    PingStatus::HealthyBusy
                } else {
                    PingStatus::Healthy
                }
            });

        let mut state = self.status.lock();
        if state.last_known != Some(status) {
            state.last_known = Some(status);
            state.last_update = Utc::now().timestamp();
        }
        status
    }

    fn custom_ping_status(&self) -> Option<PingStatus> {
        let handler = self.ping_handler.as_ref()?;
        match std::panic::catch_unwind(AssertUnwindSafe(|| handler())) {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!(
                    "Custom ping handler failed, falling back to automatic: {}: {}",
                    e.kind(),
                    e
                );
                None
            }
            Err(_) => {
                warn!("Custom ping handler panicked, falling back to automatic");
                None
            }
        }
    }

    /// Unix seconds of the last status transition.
    pub fn time_of_last_update(&self) -> i64 {
        self.status.lock().last_update
    }

    pub fn ping_response(&self) -> PingResponse {
        let status = self.current_ping_status();
        PingResponse {
            status,
            time_of_last_update: self.time_of_last_update(),
        }
    }

    pub fn force_ping_status(&self, status: PingStatus) {
        self.status.lock().forced = Some(status);
    }

    pub fn clear_forced_ping_status(&self) {
        self.status.lock().forced = None;
    }

    /// Register background work for health tracking.
    ///
    /// ```no_run
    /// # use agentcore_core::AgentCoreApp;
    /// # let app = AgentCoreApp::builder().build();
    /// let task_id = app.add_async_task("file_processing", Some(serde_json::json!({"file": "data.csv"})));
    /// // ... do background work ...
    /// app.complete_async_task(task_id);
    /// ```
    pub fn add_async_task(&self, name: &str, metadata: Option<Value>) -> TaskId {
        self.tasks.add(name, metadata)
    }

    /// Returns true if the task was found and completed.
    pub fn complete_async_task(&self, task_id: TaskId) -> bool {
        self.tasks.complete(task_id)
    }

    pub fn async_task_info(&self) -> AsyncTaskInfo {
        self.tasks.info()
    }

    /// Run `fut` as a tracked async task: the app reports `HealthyBusy` until
    /// it finishes, fails, or is dropped.
    pub async fn track_async_task<F, T, E>(&self, name: &str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let _guard = self.tasks.start(name, None);
        debug!("Starting async task: {}", name);
        let start = Instant::now();

        let result = fut.await;
        let duration = start.elapsed().as_secs_f64();
        match &result {
            Ok(_) => info!("Async task completed: {} ({:.3}s)", name, duration),
            Err(e) => error!("Async task failed: {} ({:.3}s) - {}", name, duration, e),
        }
        result
    }

    /// Handle a debug action named in an invocation payload.
    pub fn handle_debug_action(&self, action: &str) -> Result<Value, InvocationError> {
        debug!("Processing debug action: {}", action);
        let Some(parsed) = DebugAction::parse(action) else {
            warn!("Unknown debug action requested: {}", action);
            return Err(InvocationError::UnknownAction(action.to_string()));
        };

        let response = match parsed {
            DebugAction::PingStatus => json!(self.ping_response()),
            DebugAction::JobStatus => json!(self.async_task_info()),
            DebugAction::ForceHealthy => {
                self.force_ping_status(PingStatus::Healthy);
                info!("Ping status forced to Healthy");
                json!({"forced_status": "Healthy"})
            }
            DebugAction::ForceBusy => {
                self.force_ping_status(PingStatus::HealthyBusy);
                info!("Ping status forced to HealthyBusy");
                json!({"forced_status": "HealthyBusy"})
            }
            DebugAction::ClearForcedStatus => {
                self.clear_forced_ping_status();
                info!("Forced ping status cleared");
                json!({"forced_status": "Cleared"})
            }
        };
        debug!("Debug action '{}' completed successfully", parsed.as_str());
        Ok(response)
    }

    /// Process one invocation payload.
    ///
    /// Fails fast with [`InvocationError::ServerBusy`] when every invocation
    /// slot is taken; the slot is released as soon as the entrypoint returns.
    pub async fn invoke(&self, payload: Value, ctx: RequestContext) -> Result<Invocation, InvocationError> {
        let start = Instant::now();
        counter!("agentcore_invocations_total").increment(1);

        if self.debug {
            if let Some(action) = DebugAction::requested(&payload) {
                let response = self.handle_debug_action(&action)?;
                info!("Debug action completed ({:.3}s)", start.elapsed().as_secs_f64());
                return Ok(Invocation::Json(response));
            }
        }

        let Some(entrypoint) = self.entrypoint.clone() else {
            error!("No entrypoint defined");
            return Err(InvocationError::NoEntrypoint);
        };

        let _permit = match self.invocation_permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                counter!("agentcore_invocations_rejected_total").increment(1);
                warn!("Rejecting invocation: all {} slots busy", self.max_concurrent_invocations);
                return Err(InvocationError::ServerBusy);
            }
        };

        let result = Self::run_entrypoint(entrypoint, payload, ctx).await;
        let duration = start.elapsed().as_secs_f64();
        match &result {
            Ok(Invocation::Stream(_)) => {
                counter!("agentcore_streaming_responses_total").increment(1);
                info!("Returning streaming response ({:.3}s)", duration);
            }
            Ok(Invocation::Json(_)) => info!("Invocation completed successfully ({:.3}s)", duration),
            Err(e) => {
                counter!("agentcore_invocation_errors_total").increment(1);
                error!("Invocation failed ({:.3}s): {}: {}", duration, e.kind(), e);
            }
        }
        Ok(result?)
    }

    async fn run_entrypoint(
        entrypoint: Entrypoint,
        payload: Value,
        ctx: RequestContext,
    ) -> Result<Invocation, HandlerError> {
        let token = ctx.workload_access_token.clone();
        match entrypoint {
            Entrypoint::Async(handler) => {
                let fut = AgentCoreContext::scope(token, handler(payload, ctx));
                AssertUnwindSafe(fut)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(HandlerError::new("Panic", "Entrypoint panicked")))
            }
            Entrypoint::Blocking(handler) => {
                tokio::task::spawn_blocking(move || {
                    AgentCoreContext::sync_scope(token, || handler(payload, ctx))
                })
                .await
                .unwrap_or_else(|e| {
                    let kind = if e.is_panic() { "Panic" } else { "Cancelled" };
                    Err(HandlerError::new(kind, format!("Entrypoint did not complete: {}", e)))
                })
            }
        }
    }
}

impl fmt::Debug for AgentCoreApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCoreApp")
            .field("has_entrypoint", &self.entrypoint.is_some())
            .field("has_ping_handler", &self.ping_handler.is_some())
            .field("debug", &self.debug)
            .field("max_concurrent_invocations", &self.max_concurrent_invocations)
            .finish()
    }
}

fn describe_app_metrics() {
    static DESCRIBE: Once = Once::new();
    DESCRIBE.call_once(|| {
        describe_counter!("agentcore_invocations_total", "Total number of invocation requests");
        describe_counter!(
            "agentcore_invocations_rejected_total",
            "Invocations rejected because every slot was busy"
        );
        describe_counter!(
            "agentcore_invocation_errors_total",
            "Invocations whose entrypoint returned an error"
        );
        describe_counter!(
            "agentcore_streaming_responses_total",
            "Invocations answered with a server-sent event stream"
        );
    });
}
