// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cached workload access and workload updates.
//!
//! Deployments, StatefulSets and DaemonSets are mirrored by reflectors, so a reload
//! trigger never lists workloads from the API server.

use crate::error::{ReloaderError, Result};
use crate::types::workload::Workload;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use kube::{
    api::PostParams,
    runtime::{
        reflector::{self, store::Writer, Store},
        watcher, WatchStreamExt,
    },
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info, instrument, warn};

/// Read side of the workload reflectors
#[derive(Clone)]
pub struct WorkloadCache {
    deployments: Store<Deployment>,
    stateful_sets: Store<StatefulSet>,
    daemon_sets: Store<DaemonSet>,
}

impl WorkloadCache {
    pub(crate) fn from_stores(
        deployments: Store<Deployment>,
        stateful_sets: Store<StatefulSet>,
        daemon_sets: Store<DaemonSet>,
    ) -> Self {
        Self {
            deployments,
            stateful_sets,
            daemon_sets,
        }
    }

    /// Wait until every reflector has completed its initial list
    pub async fn wait_until_ready(&self) -> Result<()> {
        let not_ready = |e: reflector::store::WriterDropped| ReloaderError::CacheNotReady(e.to_string());
        self.deployments.wait_until_ready().await.map_err(not_ready)?;
        self.stateful_sets.wait_until_ready().await.map_err(not_ready)?;
        self.daemon_sets.wait_until_ready().await.map_err(not_ready)?;
        Ok(())
    }

    /// Cached workloads in the namespace: Deployments, then StatefulSets, then DaemonSets,
    /// each sorted by name
    pub fn list(&self, namespace: &str) -> Vec<Workload> {
        let mut workloads = Vec::new();
        workloads.extend(cached(&self.deployments, namespace).into_iter().map(Workload::Deployment));
        workloads.extend(cached(&self.stateful_sets, namespace).into_iter().map(Workload::StatefulSet));
        workloads.extend(cached(&self.daemon_sets, namespace).into_iter().map(Workload::DaemonSet));

        debug!("Found {} cached workloads in namespace {}", workloads.len(), namespace);
        workloads
    }
}

fn cached<K>(store: &Store<K>, namespace: &str) -> Vec<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let mut objects: Vec<K> = store
        .state()
        .into_iter()
        .filter(|obj| obj.namespace().as_deref() == Some(namespace))
        .map(|obj| K::clone(&obj))
        .collect();
    objects.sort_by_key(|obj| obj.name_any());
    objects
}

/// Write side of the workload reflectors; `run` keeps the cache in sync
pub struct WorkloadReflector {
    client: Client,
    deployments: Writer<Deployment>,
    stateful_sets: Writer<StatefulSet>,
    daemon_sets: Writer<DaemonSet>,
}

impl WorkloadReflector {
    pub fn new(client: Client) -> (Self, WorkloadCache) {
        let (deployments, deployments_writer) = reflector::store();
        let (stateful_sets, stateful_sets_writer) = reflector::store();
        let (daemon_sets, daemon_sets_writer) = reflector::store();

        let reflector = Self {
            client,
            deployments: deployments_writer,
            stateful_sets: stateful_sets_writer,
            daemon_sets: daemon_sets_writer,
        };
        let cache = WorkloadCache::from_stores(deployments, stateful_sets, daemon_sets);
        (reflector, cache)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            client,
            deployments,
            stateful_sets,
            daemon_sets,
        } = self;

        info!("Caching Deployments, StatefulSets and DaemonSets in all namespaces");
        tokio::try_join!(
            reflect(Api::all(client.clone()), deployments),
            reflect(Api::all(client.clone()), stateful_sets),
            reflect(Api::all(client), daemon_sets),
        )?;
        Ok(())
    }
}

async fn reflect<K>(api: Api<K>, writer: Writer<K>) -> anyhow::Result<()>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let mut events = watcher(api, WatcherConfig::default())
        .default_backoff()
        .reflect(writer)
        .boxed();

    while let Some(event) = events.next().await {
        if let Err(e) = event {
            warn!("{} cache watch error: {}", K::kind(&()), e);
        }
    }

    warn!("{} cache watch stream ended", K::kind(&()));
    Ok(())
}

/// Replace a workload, carrying its resourceVersion so a stale write fails with a conflict
#[instrument(skip(client, workload), fields(kind = workload.kind(), name = %workload.name()))]
pub async fn replace_workload(client: &Client, workload: &Workload) -> Result<()> {
    let name = workload.name();
    let namespace = workload.namespace().ok_or_else(|| {
        ReloaderError::InvalidWorkload(format!("{} {} has no namespace", workload.kind(), name))
    })?;
    let pp = PostParams::default();

    match workload {
        Workload::Deployment(w) => {
            let api: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
            api.replace(&name, &pp, w).await?;
        }
        Workload::StatefulSet(w) => {
            let api: Api<StatefulSet> = Api::namespaced(client.clone(), &namespace);
            api.replace(&name, &pp, w).await?;
        }
        Workload::DaemonSet(w) => {
            let api: Api<DaemonSet> = Api::namespaced(client.clone(), &namespace);
            api.replace(&name, &pp, w).await?;
        }
    }

    Ok(())
}
