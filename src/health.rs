// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Liveness and readiness endpoints.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use tracing::info;

async fn ok() -> &'static str {
    "ok"
}

pub fn health_router() -> Router {
    Router::new()
        .route("/healthz", get(ok))
        .route("/readyz", get(ok))
}

/// Serve the probe endpoints over plain HTTP
pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health probe address {}", addr))?;

    info!(addr = %addr, "Starting health probe server");
    axum::serve(listener, health_router())
        .await
        .context("Health probe server failed")
}
