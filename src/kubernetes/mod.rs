// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for workload access and event publishing.

pub mod events;
pub mod workloads;

pub use events::{EventPublisher, KubeEventPublisher, NoopEventPublisher};
pub use workloads::{replace_workload, WorkloadCache, WorkloadReflector};
