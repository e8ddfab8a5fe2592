// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap/Secret watcher - turns every create, update and delete into a reload trigger.
//!
//! Only object metadata is watched, so Secret payloads never reach the operator.

use crate::reload::{ReloadManagerHandle, Trigger};
use crate::types::reference::ConfigKind;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{
    core::PartialObjectMeta,
    runtime::{metadata_watcher, watcher, WatchStreamExt},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub struct ConfigWatcher {
    client: Client,
    kind: ConfigKind,
    reload_handle: ReloadManagerHandle,
}

impl ConfigWatcher {
    pub fn new(client: Client, kind: ConfigKind, reload_handle: ReloadManagerHandle) -> Self {
        Self {
            client,
            kind,
            reload_handle,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Watching {} changes in all namespaces", self.kind);
        match self.kind {
            ConfigKind::ConfigMap => self.watch::<ConfigMap>().await,
            ConfigKind::Secret => self.watch::<Secret>().await,
        }
    }

    async fn watch<K>(&self) -> anyhow::Result<()>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let mut events = metadata_watcher(api, WatcherConfig::default())
            .default_backoff()
            .boxed();

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(trigger) = trigger_for(self.kind, &event) {
                        debug!(
                            "{} {}/{} changed",
                            trigger.kind, trigger.namespace, trigger.name
                        );
                        self.reload_handle.send(trigger).await;
                    }
                }
                Err(e) => warn!("{} watch error: {}", self.kind, e),
            }
        }

        // The backoff keeps the stream alive, so this is only reached on shutdown
        warn!("{} watch stream ended", self.kind);
        Ok(())
    }
}

/// Map a watch event to a trigger; bookkeeping events yield none
fn trigger_for<K>(kind: ConfigKind, event: &watcher::Event<PartialObjectMeta<K>>) -> Option<Trigger>
where
    K: Resource<DynamicType = ()>,
{
    match event {
        watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) | watcher::Event::Delete(obj) => {
            Some(Trigger::new(
                kind,
                obj.namespace().unwrap_or_default(),
                obj.name_any(),
            ))
        }
        watcher::Event::Init | watcher::Event::InitDone => None,
    }
}
