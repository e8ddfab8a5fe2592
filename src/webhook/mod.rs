// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Mutating admission webhook for Deployments, StatefulSets and DaemonSets.
//!
//! Served over TLS with the certificate pair found in the configured directory.

pub mod mutate;

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::post, Router};
use axum_server::tls_rustls::RustlsConfig;
use kube::Client;
use tracing::info;

use crate::config::Config;
use crate::constants::server::MUTATE_PATH;
use crate::metrics::Metrics;
use crate::types::workload::WorkloadRegistry;

/// Shared state for webhook handlers
#[derive(Clone)]
pub struct WebhookState {
    /// Client for metadata lookups of referenced ConfigMaps and Secrets
    pub client: Client,
    pub registry: Arc<WorkloadRegistry>,
    pub metrics: Metrics,
}

impl WebhookState {
    pub fn new(client: Client, registry: Arc<WorkloadRegistry>, metrics: Metrics) -> Self {
        Self {
            client,
            registry,
            metrics,
        }
    }
}

pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(MUTATE_PATH, post(mutate::mutate_handler))
        .with_state(state)
}

/// Serve the webhook until the listener fails
pub async fn serve(config: &Config, state: Arc<WebhookState>) -> anyhow::Result<()> {
    let tls_config = RustlsConfig::from_pem_file(config.tls_cert_path(), config.tls_key_path())
        .await
        .with_context(|| {
            format!(
                "Failed to load webhook certificate from {}",
                config.webhook_tls_directory.display()
            )
        })?;

    info!(addr = %config.webhook_bind_address, "Starting admission webhook server");
    axum_server::bind_rustls(config.webhook_bind_address, tls_config)
        .serve(webhook_router(state).into_make_service())
        .await
        .context("Admission webhook server failed")
}
