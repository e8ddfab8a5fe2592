// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use crate::kubernetes::{EventPublisher, WorkloadCache};
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::ObjectReference;
use kube::client::Body;
use kube::runtime::events::EventType;
use kube::runtime::reflector::{self, Store};
use kube::runtime::watcher;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Clone)]
enum MockResponse {
    Fixed(u16, String),
    /// Reply with the request body, as the API server does for a successful update
    Echo,
}

/// A request received by the mock API server
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Clones share their responses and request log, so a test can keep one clone to
/// inspect or reconfigure while the client owns another.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add (or replace) a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.insert("GET", path, MockResponse::Fixed(status, body.to_string()));
        self
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.insert("PUT", path, MockResponse::Fixed(status, body.to_string()));
        self
    }

    /// Accept PUT requests on the exact path and echo the submitted object
    pub fn on_put_echo(self, path: &str) -> Self {
        self.insert("PUT", path, MockResponse::Echo);
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests received so far with the given method
    pub fn requests(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    fn insert(&self, method: &str, path: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), response);
    }

    fn find_response(&self, method: &str, path: &str) -> Option<MockResponse> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let this = self.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let bytes = req
                .into_body()
                .collect()
                .await
                .map_err(|e| -> tower::BoxError { e.into() })?
                .to_bytes();
            let body = String::from_utf8_lossy(&bytes).into_owned();

            this.requests.lock().unwrap().push(RecordedRequest {
                method: method.clone(),
                path: path.clone(),
                body: body.clone(),
            });

            // Default 404 for unmatched requests
            let (status, body) = match this.find_response(&method, &path) {
                Some(MockResponse::Fixed(status, body)) => (status, body),
                Some(MockResponse::Echo) => (200, body),
                None => (404, not_found_json("object", &path)),
            };

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Metadata-only view of a ConfigMap or Secret, as returned for `as=PartialObjectMetadata`
pub fn object_meta_json(namespace: &str, name: &str, uid: &str, resource_version: &str) -> String {
    serde_json::json!({
        "apiVersion": "meta.k8s.io/v1",
        "kind": "PartialObjectMetadata",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": uid,
            "resourceVersion": resource_version
        }
    })
    .to_string()
}

pub fn config_map_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/configmaps/{}", namespace, name)
}

pub fn secret_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/secrets/{}", namespace, name)
}

/// A workload object with the given annotations and an unannotated pod template
pub fn workload_value(
    kind: &str,
    namespace: &str,
    name: &str,
    annotations: &[(&str, &str)],
) -> serde_json::Value {
    let annotations: BTreeMap<&str, &str> = annotations.iter().copied().collect();
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": kind,
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("{}/{}/{}", kind, namespace, name),
            "resourceVersion": "7",
            "annotations": annotations
        },
        "spec": {
            "selector": { "matchLabels": { "app": name } },
            "serviceName": name,
            "template": {
                "metadata": { "labels": { "app": name } },
                "spec": { "containers": [{ "name": "app", "image": "nginx" }] }
            }
        }
    })
}

/// A synced reflector store holding the given objects
fn synced_store<K>(objects: Vec<K>) -> Store<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let (store, mut writer) = reflector::store();
    writer.apply_watcher_event(&watcher::Event::Init);
    for object in objects {
        writer.apply_watcher_event(&watcher::Event::InitApply(object));
    }
    writer.apply_watcher_event(&watcher::Event::InitDone);
    store
}

fn of_kind<K: DeserializeOwned>(workloads: &[serde_json::Value], kind: &str) -> Vec<K> {
    workloads
        .iter()
        .filter(|w| w["kind"] == kind)
        .map(|w| serde_json::from_value(w.clone()).unwrap())
        .collect()
}

/// A synced workload cache holding the given workload objects (see [`workload_value`])
pub fn workload_cache(workloads: Vec<serde_json::Value>) -> WorkloadCache {
    WorkloadCache::from_stores(
        synced_store::<Deployment>(of_kind(&workloads, "Deployment")),
        synced_store::<StatefulSet>(of_kind(&workloads, "StatefulSet")),
        synced_store::<DaemonSet>(of_kind(&workloads, "DaemonSet")),
    )
}

/// A workload cache whose reflectors stopped before the initial list completed
pub fn unsynced_workload_cache() -> WorkloadCache {
    let (deployments, _) = reflector::store::<Deployment>();
    let (stateful_sets, _) = reflector::store::<StatefulSet>();
    let (daemon_sets, _) = reflector::store::<DaemonSet>();
    WorkloadCache::from_stores(deployments, stateful_sets, daemon_sets)
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a 500 internal error response
pub fn internal_error_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": "etcdserver: request timed out",
        "reason": "InternalError",
        "code": 500
    })
    .to_string()
}

/// An event published through [`RecordingEventPublisher`]
#[derive(Clone, Debug)]
pub struct PublishedEvent {
    pub object: ObjectReference,
    pub reason: String,
    pub note: Option<String>,
}

/// Event publisher that keeps every event in memory
#[derive(Clone, Default)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<PublishedEvent>>>,
}

impl RecordingEventPublisher {
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        _type_: EventType,
        reason: &str,
        _action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(PublishedEvent {
            object: resource_ref.clone(),
            reason: reason.to_string(),
            note,
        });
    }
}
