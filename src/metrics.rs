// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for reloads and admissions, exported on `/metrics`.

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::{error, info};

const NAMESPACE: &str = "pod_reloader";

/// Outcome label of a processed reload trigger
pub mod reload_outcome {
    pub const UPDATED: &str = "updated";
    pub const UNCHANGED: &str = "unchanged";
    pub const FAILED: &str = "failed";
}

/// Outcome label of an admission review
pub mod admission_outcome {
    pub const PATCHED: &str = "patched";
    pub const SKIPPED: &str = "skipped";
    pub const DENIED: &str = "denied";
}

/// Process-wide counters; clones share the same registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Reload triggers processed, by configuration kind and outcome
    pub reloads_total: IntCounterVec,
    /// Workloads annotated for a reload, by configuration kind
    pub workloads_annotated_total: IntCounterVec,
    /// Admission reviews answered, by workload kind and outcome
    pub admissions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let reloads_total = IntCounterVec::new(
            Opts::new("reloads_total", "Reload triggers processed").namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(reloads_total.clone()))?;

        let workloads_annotated_total = IntCounterVec::new(
            Opts::new(
                "workloads_annotated_total",
                "Workloads annotated with a new configuration hash",
            )
            .namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(workloads_annotated_total.clone()))?;

        let admissions_total = IntCounterVec::new(
            Opts::new("admissions_total", "Admission reviews answered").namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(admissions_total.clone()))?;

        Ok(Self {
            registry,
            reloads_total,
            workloads_annotated_total,
            admissions_total,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

async fn metrics_handler(State(metrics): State<Metrics>) -> Response {
    match metrics.export() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to export metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn metrics_router(metrics: Metrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

/// Serve the metrics endpoint over plain HTTP
pub async fn serve(addr: SocketAddr, metrics: Metrics) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics address {}", addr))?;

    info!(addr = %addr, "Starting metrics server");
    axum::serve(listener, metrics_router(metrics))
        .await
        .context("Metrics server failed")
}
