// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::application::app::AgentCoreApp;
use crate::presentation::api;
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 8080;

const DOCKER_MARKER: &str = "/.dockerenv";
const DOCKER_ENV: &str = "DOCKER_CONTAINER";

pub fn running_in_container() -> bool {
    Path::new(DOCKER_MARKER).exists()
        || std::env::var(DOCKER_ENV).is_ok_and(|v| !v.is_empty())
}

/// Bind address: the explicit host if given, otherwise all interfaces inside
/// a container and loopback elsewhere.
pub fn resolve_host(host: Option<&str>) -> String {
    resolve_host_with(host, running_in_container())
}

pub fn resolve_host_with(host: Option<&str>, in_container: bool) -> String {
    match host.filter(|h| !h.is_empty()) {
        Some(h) => h.to_string(),
        None if in_container => "0.0.0.0".to_string(),
        None => "127.0.0.1".to_string(),
    }
}

impl AgentCoreApp {
    pub fn router(self: Arc<Self>) -> Router {
        api::router(self)
    }

    /// Serve on `host:port` until Ctrl+C or SIGTERM.
    pub async fn run(self, port: u16, host: Option<&str>) -> Result<()> {
        let addr = format!("{}:{}", resolve_host(host), port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        info!("Starting server on {}", addr);
        Arc::new(self)
            .serve_with_shutdown(listener, shutdown_signal())
            .await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")?;

        info!("Server shutting down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
