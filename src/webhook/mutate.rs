// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload Mutation Webhook
//!
//! Recomputes the configuration hash for every create/update of an opted-in
//! Deployment, StatefulSet or DaemonSet and stamps it into the pod template.
//! A hash carried on the workload by a reload handler must match the freshly
//! computed one; otherwise the request is rejected so the triggering update is retried.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
};
use tracing::{debug, error, info, warn};

use crate::constants::annotations;
use crate::error::{ReloaderError, Result};
use crate::fingerprint::fingerprint_for_workload;
use crate::metrics::admission_outcome;
use crate::types::reference::has_references;
use crate::types::workload::Workload;

use super::WebhookState;

/// Handle a mutating admission review for a workload
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    payload: std::result::Result<Json<AdmissionReview<DynamicObject>>, JsonRejection>,
) -> Json<AdmissionReview<DynamicObject>> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            error!(error = %rejection, "Failed to decode admission review");
            let mut response = AdmissionResponse::invalid(rejection.body_text());
            response.result.code = StatusCode::BAD_REQUEST.as_u16();
            return Json(response.into_review());
        }
    };

    let request: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(review(&state, &request).await.into_review())
}

/// Build the admission response for a single request
pub async fn review(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let response = respond(state, request).await;

    let outcome = if !response.allowed {
        admission_outcome::DENIED
    } else if response.patch.is_some() {
        admission_outcome::PATCHED
    } else {
        admission_outcome::SKIPPED
    };
    state
        .metrics
        .admissions_total
        .with_label_values(&[request.kind.kind.as_str(), outcome])
        .inc();

    response
}

async fn respond(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    match mutate(state, request).await {
        Ok(None) => AdmissionResponse::from(request),
        Ok(Some(patch)) => match AdmissionResponse::from(request).with_patch(patch) {
            Ok(response) => response,
            Err(e) => {
                error!(uid = %request.uid, error = %e, "Failed to serialize patch");
                reject(
                    request,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("patch serialization error: {e}"),
                )
            }
        },
        Err(e) => {
            warn!(
                uid = %request.uid,
                kind = %request.kind.kind,
                namespace = ?request.namespace,
                name = %request.name,
                error = %e,
                "Rejecting admission request"
            );
            reject(request, status_for(&e), e.to_string())
        }
    }
}

/// Compute the JSON patch for a request; None when the workload declares no references
pub async fn mutate(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
) -> Result<Option<json_patch::Patch>> {
    match request.operation {
        Operation::Create | Operation::Update => {}
        _ => {
            return Err(ReloaderError::UnsupportedOperation(format!(
                "{:?}; this admission webhook may only be called for create/update operations",
                request.operation
            )))
        }
    }

    let object = request.object.as_ref().ok_or_else(|| {
        ReloaderError::DecodeError("admission request carries no object".to_string())
    })?;
    let original = state.registry.decode(&request.kind, object)?;

    if !has_references(original.metadata().annotations.as_ref()) {
        debug!(
            kind = original.kind(),
            name = %original.name(),
            "No configuration references, allowing unchanged"
        );
        return Ok(None);
    }

    // A create request may leave the namespace to the request path
    let namespace = original
        .namespace()
        .filter(|ns| !ns.is_empty())
        .or_else(|| request.namespace.clone())
        .unwrap_or_default();

    let hash =
        fingerprint_for_workload(&state.client, &namespace, original.metadata().annotations.as_ref())
            .await?;

    let mut mutated = original.clone();
    stamp(&mut mutated, &hash)?;

    let patch = json_patch::diff(
        &serde_json::to_value(&original)?,
        &serde_json::to_value(&mutated)?,
    );
    Ok(Some(patch))
}

/// Validate and consume a carried hash, then stamp `hash` into the pod template.
///
/// On a mismatch the workload is left unchanged.
pub fn stamp(workload: &mut Workload, hash: &str) -> Result<()> {
    let kind = workload.kind();
    let name = workload.name();

    if let Some(object_annotations) = workload.metadata_mut().annotations.as_mut() {
        if let Some(carried) = object_annotations.get(annotations::CONFIG_HASH) {
            info!(
                kind,
                name = %name,
                "Got injected configuration hash (probably set by controller due to config map or secret change)"
            );
            if carried != hash {
                return Err(ReloaderError::ConfigurationDrift {
                    carried: carried.clone(),
                    computed: hash.to_string(),
                });
            }
            object_annotations.remove(annotations::CONFIG_HASH);
        }
    }

    let template = workload.pod_template_mut().ok_or_else(|| {
        ReloaderError::InvalidWorkload(format!("{} {} has no spec", kind, name))
    })?;
    let template_annotations = template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(BTreeMap::new);

    match template_annotations.get(annotations::CONFIG_HASH) {
        None => info!(kind, name = %name, "Setting initial configuration hash"),
        Some(current) if current != hash => {
            info!(kind, name = %name, "Updating configuration hash")
        }
        Some(_) => {}
    }
    template_annotations.insert(annotations::CONFIG_HASH.to_string(), hash.to_string());

    Ok(())
}

/// HTTP status reported for a failed admission
fn status_for(error: &ReloaderError) -> StatusCode {
    match error {
        ReloaderError::KubeError(_) | ReloaderError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

fn reject(
    request: &AdmissionRequest<DynamicObject>,
    status: StatusCode,
    message: String,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request).deny(message);
    response.result.code = status.as_u16();
    response
}
