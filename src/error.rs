// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloaderError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to decode object: {0}")]
    DecodeError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported object kind: {0}")]
    UnsupportedKind(String),

    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    #[error("Workload cache is not available: {0}")]
    CacheNotReady(String),

    #[error("Injected hash {carried} does not match calculated hash {computed}")]
    ConfigurationDrift { carried: String, computed: String },
}

pub type Result<T> = std::result::Result<T, ReloaderError>;
