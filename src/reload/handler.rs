// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Re-stamps the workloads that reference a changed ConfigMap or Secret.

use crate::constants::{annotations, events};
use crate::error::Result;
use crate::fingerprint::fingerprint_for_workload;
use crate::kubernetes::{replace_workload, EventPublisher, WorkloadCache};
use crate::types::reference::{references, ConfigKind};
use kube::runtime::events::EventType;
use kube::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct ReloadHandler {
    client: Client,
    cache: WorkloadCache,
    kind: ConfigKind,
    events: Arc<dyn EventPublisher>,
}

impl ReloadHandler {
    pub fn new(
        client: Client,
        cache: WorkloadCache,
        kind: ConfigKind,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            client,
            cache,
            kind,
            events,
        }
    }

    pub fn kind(&self) -> ConfigKind {
        self.kind
    }

    /// Annotate every workload in `namespace` that references `name` with a freshly
    /// computed hash and update it. Returns the number of workloads updated.
    ///
    /// Workloads are read from the cache; a stale entry fails the update with a conflict.
    /// Any cache, lookup or update error aborts the run; the caller re-delivers the trigger.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn handle(&self, namespace: &str, name: &str) -> Result<usize> {
        debug!("Running reload check");

        self.cache.wait_until_ready().await?;
        let workloads = self.cache.list(namespace);
        let mut updated = 0;

        for mut workload in workloads {
            if !references(workload.metadata().annotations.as_ref(), self.kind, name) {
                continue;
            }

            info!(
                "Annotating {} {}/{}",
                workload.kind(),
                namespace,
                workload.name()
            );

            let hash =
                fingerprint_for_workload(&self.client, namespace, workload.metadata().annotations.as_ref())
                    .await?;
            workload
                .metadata_mut()
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(annotations::CONFIG_HASH.to_string(), hash);

            replace_workload(&self.client, &workload).await?;
            updated += 1;

            self.events
                .publish(
                    &workload.object_ref(),
                    EventType::Normal,
                    events::REASON_CONFIGURATION_CHANGED,
                    events::ACTION_RELOAD,
                    Some(format!(
                        "Reload triggered due to change of referenced {} {}/{}",
                        self.kind, namespace, name
                    )),
                )
                .await;
        }

        Ok(updated)
    }
}
