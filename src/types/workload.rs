// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload kinds whose pod templates carry the configuration hash.

use crate::error::{ReloaderError, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec};
use kube::api::{DynamicObject, ObjectMeta};
use kube::core::GroupVersionKind;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// A Deployment, StatefulSet or DaemonSet.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Workload {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
}

impl Workload {
    pub fn kind(&self) -> &'static str {
        match self {
            Workload::Deployment(_) => "Deployment",
            Workload::StatefulSet(_) => "StatefulSet",
            Workload::DaemonSet(_) => "DaemonSet",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Workload::Deployment(w) => &w.metadata,
            Workload::StatefulSet(w) => &w.metadata,
            Workload::DaemonSet(w) => &w.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Workload::Deployment(w) => &mut w.metadata,
            Workload::StatefulSet(w) => &mut w.metadata,
            Workload::DaemonSet(w) => &mut w.metadata,
        }
    }

    /// The pod template, or None if the object carries no spec
    pub fn pod_template(&self) -> Option<&PodTemplateSpec> {
        match self {
            Workload::Deployment(w) => w.spec.as_ref().map(|s| &s.template),
            Workload::StatefulSet(w) => w.spec.as_ref().map(|s| &s.template),
            Workload::DaemonSet(w) => w.spec.as_ref().map(|s| &s.template),
        }
    }

    pub fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
        match self {
            Workload::Deployment(w) => w.spec.as_mut().map(|s| &mut s.template),
            Workload::StatefulSet(w) => w.spec.as_mut().map(|s| &mut s.template),
            Workload::DaemonSet(w) => w.spec.as_mut().map(|s| &mut s.template),
        }
    }

    pub fn name(&self) -> String {
        self.metadata().name.clone().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<String> {
        self.metadata().namespace.clone()
    }

    pub fn object_ref(&self) -> ObjectReference {
        match self {
            Workload::Deployment(w) => w.object_ref(&()),
            Workload::StatefulSet(w) => w.object_ref(&()),
            Workload::DaemonSet(w) => w.object_ref(&()),
        }
    }
}

type Decoder = Box<dyn Fn(serde_json::Value) -> serde_json::Result<Workload> + Send + Sync>;

/// Maps a group/version/kind to the decoder for the matching workload variant.
///
/// Built once at startup and shared with the admission webhook.
pub struct WorkloadRegistry {
    decoders: HashMap<(String, String, String), Decoder>,
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };
        registry.register(Workload::Deployment);
        registry.register(Workload::StatefulSet);
        registry.register(Workload::DaemonSet);
        registry
    }

    fn register<K>(&mut self, wrap: fn(K) -> Workload)
    where
        K: Resource<DynamicType = ()> + DeserializeOwned + 'static,
    {
        let key = (
            K::group(&()).into_owned(),
            K::version(&()).into_owned(),
            K::kind(&()).into_owned(),
        );
        let decoder: Decoder =
            Box::new(move |value: serde_json::Value| serde_json::from_value::<K>(value).map(wrap));
        self.decoders.insert(key, decoder);
    }

    /// Decode an admission object into the workload variant registered for `gvk`
    pub fn decode(&self, gvk: &GroupVersionKind, object: &DynamicObject) -> Result<Workload> {
        let key = (gvk.group.clone(), gvk.version.clone(), gvk.kind.clone());
        let Some(decoder) = self.decoders.get(&key) else {
            return Err(ReloaderError::UnsupportedKind(format!(
                "{}/{} {}",
                gvk.group, gvk.version, gvk.kind
            )));
        };

        let value = serde_json::to_value(object)?;
        decoder(value).map_err(|e| ReloaderError::DecodeError(e.to_string()))
    }
}

impl Default for WorkloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
