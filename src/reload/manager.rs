// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-kind trigger queue with bounded concurrency and re-delivery of failed triggers.

use crate::constants::reload::{CHANNEL_CAPACITY, REQUEUE_INTERVAL_SECS, REQUEUE_MAX_INTERVAL_SECS};
use crate::metrics::{reload_outcome, Metrics};
use crate::reload::handler::ReloadHandler;
use crate::types::reference::ConfigKind;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A change of a ConfigMap or Secret, identified by namespace and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub kind: ConfigKind,
    pub namespace: String,
    pub name: String,
    /// Number of failed deliveries so far
    pub attempt: u32,
}

impl Trigger {
    pub fn new(kind: ConfigKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            attempt: 0,
        }
    }
}

/// Receives triggers for one configuration kind and runs the reload handler for them.
pub struct ReloadManager {
    handler: Arc<ReloadHandler>,
    trigger_rx: mpsc::Receiver<Trigger>,
    requeue_tx: mpsc::Sender<Trigger>,
    max_concurrent: usize,
    metrics: Metrics,
}

/// Handle to send triggers to a ReloadManager
#[derive(Clone)]
pub struct ReloadManagerHandle {
    trigger_tx: mpsc::Sender<Trigger>,
}

impl ReloadManagerHandle {
    pub async fn send(&self, trigger: Trigger) {
        if let Err(e) = self.trigger_tx.send(trigger).await {
            error!("Failed to send trigger to ReloadManager: {}", e);
        }
    }
}

impl ReloadManager {
    pub fn new(
        handler: ReloadHandler,
        max_concurrent: usize,
        metrics: Metrics,
    ) -> (Self, ReloadManagerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let manager = Self {
            handler: Arc::new(handler),
            trigger_rx,
            requeue_tx: trigger_tx.clone(),
            max_concurrent: max_concurrent.max(1),
            metrics,
        };

        let handle = ReloadManagerHandle { trigger_tx };
        (manager, handle)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            handler,
            mut trigger_rx,
            requeue_tx,
            max_concurrent,
            metrics,
        } = self;

        info!(
            "ReloadManager for {} started, processing up to {} triggers concurrently",
            handler.kind(),
            max_concurrent
        );

        futures::stream::poll_fn(|cx| trigger_rx.poll_recv(cx))
            .for_each_concurrent(max_concurrent, |trigger| {
                let handler = handler.clone();
                let requeue_tx = requeue_tx.clone();
                let metrics = metrics.clone();
                async move { process(&handler, trigger, requeue_tx, &metrics).await }
            })
            .await;

        Ok(())
    }
}

async fn process(
    handler: &ReloadHandler,
    trigger: Trigger,
    requeue_tx: mpsc::Sender<Trigger>,
    metrics: &Metrics,
) {
    let kind = trigger.kind.to_string();
    match handler.handle(&trigger.namespace, &trigger.name).await {
        Ok(0) => {
            metrics
                .reloads_total
                .with_label_values(&[kind.as_str(), reload_outcome::UNCHANGED])
                .inc();
            debug!(
                "No workload references {} {}/{}",
                trigger.kind, trigger.namespace, trigger.name
            )
        }
        Ok(updated) => {
            metrics
                .reloads_total
                .with_label_values(&[kind.as_str(), reload_outcome::UPDATED])
                .inc();
            metrics
                .workloads_annotated_total
                .with_label_values(&[kind.as_str()])
                .inc_by(updated as u64);
            info!(
                "Triggered reload of {} workloads for {} {}/{}",
                updated, trigger.kind, trigger.namespace, trigger.name
            )
        }
        Err(e) => {
            metrics
                .reloads_total
                .with_label_values(&[kind.as_str(), reload_outcome::FAILED])
                .inc();
            let delay = requeue_delay(trigger.attempt);
            warn!(
                "Reload for {} {}/{} failed (attempt {}), retrying in {:?}: {}",
                trigger.kind,
                trigger.namespace,
                trigger.name,
                trigger.attempt + 1,
                delay,
                e
            );
            let next = Trigger {
                attempt: trigger.attempt.saturating_add(1),
                ..trigger
            };
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = requeue_tx.send(next).await {
                    error!("Failed to re-deliver trigger: {}", e);
                }
            });
        }
    }
}

/// Delay before re-delivering a trigger that failed `attempt` times before.
/// Exponential backoff starting at REQUEUE_INTERVAL_SECS with max cap.
pub fn requeue_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(
        REQUEUE_INTERVAL_SECS
            .saturating_mul(factor)
            .min(REQUEUE_MAX_INTERVAL_SECS),
    )
}
