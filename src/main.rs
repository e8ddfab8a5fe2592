// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pod_reloader::config::Config;
use pod_reloader::constants::OPERATOR_NAME;
use pod_reloader::health;
use pod_reloader::metrics::{self, Metrics};
use pod_reloader::kubernetes::{EventPublisher, KubeEventPublisher, WorkloadReflector};
use pod_reloader::reconcilers::ConfigWatcher;
use pod_reloader::reload::{ReloadHandler, ReloadManager};
use pod_reloader::types::reference::ConfigKind;
use pod_reloader::types::workload::WorkloadRegistry;
use pod_reloader::webhook::{self, WebhookState};

#[tokio::main]
async fn main() -> Result<()> {
    // kube and axum-server both pull in rustls; pick the provider explicitly
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("Failed to install rustls crypto provider: {:?}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting pod-reloader");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: webhook={}, tls_directory={}, health_probes={}, metrics={}, max_concurrent_reconciles={}",
        config.webhook_bind_address,
        config.webhook_tls_directory.display(),
        config.health_probe_bind_address,
        config.metrics_bind_address,
        config.max_concurrent_reconciles
    );

    let metrics = Metrics::new()?;

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let events: Arc<dyn EventPublisher> =
        Arc::new(KubeEventPublisher::new(client.clone(), OPERATOR_NAME));

    let (workload_reflector, workload_cache) = WorkloadReflector::new(client.clone());

    // One reload pipeline per configuration kind
    let (config_map_manager, config_map_handle) = ReloadManager::new(
        ReloadHandler::new(
            client.clone(),
            workload_cache.clone(),
            ConfigKind::ConfigMap,
            events.clone(),
        ),
        config.max_concurrent_reconciles,
        metrics.clone(),
    );
    let (secret_manager, secret_handle) = ReloadManager::new(
        ReloadHandler::new(client.clone(), workload_cache, ConfigKind::Secret, events),
        config.max_concurrent_reconciles,
        metrics.clone(),
    );
    let config_map_watcher = ConfigWatcher::new(client.clone(), ConfigKind::ConfigMap, config_map_handle);
    let secret_watcher = ConfigWatcher::new(client.clone(), ConfigKind::Secret, secret_handle);

    let webhook_state = Arc::new(WebhookState::new(
        client,
        Arc::new(WorkloadRegistry::new()),
        metrics.clone(),
    ));

    info!("Starting watchers, reload managers and servers...");

    tokio::select! {
        result = async {
            tokio::try_join!(
                workload_reflector.run(),
                config_map_manager.run(),
                secret_manager.run(),
                config_map_watcher.run(),
                secret_watcher.run(),
                webhook::serve(&config, webhook_state),
                health::serve(config.health_probe_bind_address),
                metrics::serve(config.metrics_bind_address, metrics),
            )
        } => {
            result?;
            // Every task runs until an error, so this is not expected
            warn!("All tasks stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping");
        }
    }

    Ok(())
}
