// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by pod-reloader
pub mod annotations {
    /// Comma-separated names of ConfigMaps a workload depends on
    pub const CONFIG_MAPS: &str = "pod-reloader.cs.sap.com/configmaps";
    /// Comma-separated names of Secrets a workload depends on
    pub const SECRETS: &str = "pod-reloader.cs.sap.com/secrets";
    /// Configuration hash. On the workload itself this is the transient value proposed by
    /// a reload handler; on the pod template it is the stamped value that drives rollouts.
    pub const CONFIG_HASH: &str = "pod-reloader.cs.sap.com/config-hash";
}

/// Separator used in the reference-list annotations
pub const REFERENCE_SEPARATOR: char = ',';

/// The operator name, reported as the component on published events
pub const OPERATOR_NAME: &str = "pod-reloader";

/// Event reasons and actions
pub mod events {
    pub const REASON_CONFIGURATION_CHANGED: &str = "ConfigurationChanged";
    pub const ACTION_RELOAD: &str = "Reload";
}

/// Trigger processing
pub mod reload {
    /// Capacity of the per-kind trigger channel
    pub const CHANNEL_CAPACITY: usize = 256;
    /// Default number of triggers processed concurrently per kind
    pub const DEFAULT_MAX_CONCURRENT_RECONCILES: usize = 5;
    /// Initial re-delivery delay in seconds for a failed trigger
    pub const REQUEUE_INTERVAL_SECS: u64 = 1;
    /// Maximum re-delivery delay in seconds (exponential backoff cap)
    pub const REQUEUE_MAX_INTERVAL_SECS: u64 = 300;
}

/// Listener defaults
pub mod server {
    pub const DEFAULT_WEBHOOK_BIND_ADDRESS: &str = "0.0.0.0:9443";
    pub const DEFAULT_HEALTH_PROBE_BIND_ADDRESS: &str = "0.0.0.0:8081";
    pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";
    /// Path of the mutating admission endpoint
    pub const MUTATE_PATH: &str = "/mutate";
    pub const TLS_CERT_FILE: &str = "tls.crt";
    pub const TLS_KEY_FILE: &str = "tls.key";
}
