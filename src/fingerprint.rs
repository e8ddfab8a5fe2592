// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration fingerprinting.
//!
//! A fingerprint is the SHA-256 over one line per referenced object:
//! `<kind>/<namespace>/<name>/<uid>.<resourceVersion>` for objects that exist, and
//! `<kind>/<namespace>/<name>/` for objects that do not. ConfigMaps come first, then
//! Secrets, each in declaration order. Only object metadata is fetched.

use crate::error::Result;
use crate::types::reference::{is_valid_object_name, parse_references, ConfigKind};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::api::ObjectMeta;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Compute the fingerprint over the current state of the referenced objects.
#[instrument(skip(client))]
pub async fn fingerprint(
    client: &Client,
    namespace: &str,
    config_maps: &[String],
    secrets: &[String],
) -> Result<String> {
    let mut stream = String::new();

    for name in config_maps {
        let meta = lookup::<ConfigMap>(client, namespace, name).await?;
        append_entry(&mut stream, ConfigKind::ConfigMap, namespace, name, meta.as_ref());
    }
    for name in secrets {
        let meta = lookup::<Secret>(client, namespace, name).await?;
        append_entry(&mut stream, ConfigKind::Secret, namespace, name, meta.as_ref());
    }

    Ok(digest(&stream))
}

/// Compute the fingerprint for the references declared in a workload's annotations.
pub async fn fingerprint_for_workload(
    client: &Client,
    namespace: &str,
    annotations: Option<&BTreeMap<String, String>>,
) -> Result<String> {
    let config_maps = parse_references(annotations, ConfigKind::ConfigMap);
    let secrets = parse_references(annotations, ConfigKind::Secret);
    fingerprint(client, namespace, &config_maps, &secrets).await
}

/// Fetch the metadata of a referenced object, None if it does not exist
async fn lookup<K>(client: &Client, namespace: &str, name: &str) -> Result<Option<ObjectMeta>>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    // No object can exist under an invalid name; never splice one into a request path
    if !is_valid_object_name(name) {
        debug!("Referenced {} {:?} is not a valid object name", K::kind(&()), name);
        return Ok(None);
    }

    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let meta = api.get_metadata_opt(name).await?.map(|m| m.metadata);
    if meta.is_none() {
        debug!("Referenced {} {}/{} not found", K::kind(&()), namespace, name);
    }
    Ok(meta)
}

fn append_entry(
    stream: &mut String,
    kind: ConfigKind,
    namespace: &str,
    name: &str,
    meta: Option<&ObjectMeta>,
) {
    stream.push_str(kind.prefix());
    stream.push('/');
    stream.push_str(namespace);
    stream.push('/');
    stream.push_str(name);
    stream.push('/');
    if let Some(meta) = meta {
        stream.push_str(meta.uid.as_deref().unwrap_or_default());
        stream.push('.');
        stream.push_str(meta.resource_version.as_deref().unwrap_or_default());
    }
    stream.push('\n');
}

fn digest(stream: &str) -> String {
    hex::encode(Sha256::digest(stream.as_bytes()))
}
