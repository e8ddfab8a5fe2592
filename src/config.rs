// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{reload, server};
use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the admission webhook listens on (TLS)
    pub webhook_bind_address: SocketAddr,
    /// Directory holding tls.crt and tls.key for the webhook
    pub webhook_tls_directory: PathBuf,
    /// Address the liveness/readiness endpoints listen on
    pub health_probe_bind_address: SocketAddr,
    /// Address the Prometheus metrics endpoint listens on
    pub metrics_bind_address: SocketAddr,
    /// Triggers processed concurrently per configuration kind
    pub max_concurrent_reconciles: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let webhook_bind_address = var("WEBHOOK_BIND_ADDRESS")
            .unwrap_or_else(|| server::DEFAULT_WEBHOOK_BIND_ADDRESS.to_string())
            .parse()
            .context("WEBHOOK_BIND_ADDRESS is not a valid socket address")?;

        let webhook_tls_directory = var("WEBHOOK_TLS_DIRECTORY")
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("k8s-webhook-server").join("serving-certs"));

        let health_probe_bind_address = var("HEALTH_PROBE_BIND_ADDRESS")
            .unwrap_or_else(|| server::DEFAULT_HEALTH_PROBE_BIND_ADDRESS.to_string())
            .parse()
            .context("HEALTH_PROBE_BIND_ADDRESS is not a valid socket address")?;

        let metrics_bind_address = var("METRICS_BIND_ADDRESS")
            .unwrap_or_else(|| server::DEFAULT_METRICS_BIND_ADDRESS.to_string())
            .parse()
            .context("METRICS_BIND_ADDRESS is not a valid socket address")?;

        let max_concurrent_reconciles = match var("MAX_CONCURRENT_RECONCILES") {
            Some(v) => v
                .parse()
                .context("MAX_CONCURRENT_RECONCILES is not a valid number")?,
            None => reload::DEFAULT_MAX_CONCURRENT_RECONCILES,
        };
        if max_concurrent_reconciles == 0 {
            bail!("MAX_CONCURRENT_RECONCILES must be at least 1");
        }

        Ok(Config {
            webhook_bind_address,
            webhook_tls_directory,
            health_probe_bind_address,
            metrics_bind_address,
            max_concurrent_reconciles,
        })
    }

    pub fn tls_cert_path(&self) -> PathBuf {
        self.webhook_tls_directory.join(server::TLS_CERT_FILE)
    }

    pub fn tls_key_path(&self) -> PathBuf {
        self.webhook_tls_directory.join(server::TLS_KEY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.webhook_bind_address.port(), 9443);
        assert_eq!(config.health_probe_bind_address.port(), 8081);
        assert_eq!(config.metrics_bind_address.port(), 8080);
        assert_eq!(config.max_concurrent_reconciles, 5);
        assert!(config
            .webhook_tls_directory
            .ends_with("k8s-webhook-server/serving-certs"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WEBHOOK_BIND_ADDRESS", "127.0.0.1:10443"),
            ("WEBHOOK_TLS_DIRECTORY", "/etc/webhook/certs"),
            ("HEALTH_PROBE_BIND_ADDRESS", "127.0.0.1:18081"),
            ("METRICS_BIND_ADDRESS", "127.0.0.1:18080"),
            ("MAX_CONCURRENT_RECONCILES", "2"),
        ])
        .unwrap();

        assert_eq!(config.webhook_bind_address.to_string(), "127.0.0.1:10443");
        assert_eq!(config.health_probe_bind_address.to_string(), "127.0.0.1:18081");
        assert_eq!(config.metrics_bind_address.to_string(), "127.0.0.1:18080");
        assert_eq!(config.max_concurrent_reconciles, 2);
        assert_eq!(
            config.tls_cert_path(),
            PathBuf::from("/etc/webhook/certs/tls.crt")
        );
        assert_eq!(
            config.tls_key_path(),
            PathBuf::from("/etc/webhook/certs/tls.key")
        );
    }

    #[test]
    fn test_invalid_bind_address() {
        let err = load(&[("WEBHOOK_BIND_ADDRESS", ":9443")]).unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_BIND_ADDRESS"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(load(&[("MAX_CONCURRENT_RECONCILES", "0")]).is_err());
        assert!(load(&[("MAX_CONCURRENT_RECONCILES", "many")]).is_err());
    }
}
