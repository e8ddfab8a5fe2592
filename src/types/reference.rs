// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration references declared on workloads.

use crate::constants::{annotations, REFERENCE_SEPARATOR};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of configuration object a workload can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    ConfigMap,
    Secret,
}

impl ConfigKind {
    /// Prefix of the fingerprint stream lines for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            ConfigKind::ConfigMap => "configmap",
            ConfigKind::Secret => "secret",
        }
    }

    /// Workload annotation listing referenced objects of this kind
    pub fn annotation(&self) -> &'static str {
        match self {
            ConfigKind::ConfigMap => annotations::CONFIG_MAPS,
            ConfigKind::Secret => annotations::SECRETS,
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::ConfigMap => f.write_str("ConfigMap"),
            ConfigKind::Secret => f.write_str("Secret"),
        }
    }
}

/// Names referenced by the annotation for `kind`, in declaration order.
///
/// An absent or empty annotation yields no names. Names are not trimmed or deduplicated.
pub fn parse_references(
    annotations: Option<&BTreeMap<String, String>>,
    kind: ConfigKind,
) -> Vec<String> {
    match annotations.and_then(|a| a.get(kind.annotation())) {
        Some(value) if !value.is_empty() => value
            .split(REFERENCE_SEPARATOR)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether `name` appears (exact match) in the reference list for `kind`.
pub fn references(
    annotations: Option<&BTreeMap<String, String>>,
    kind: ConfigKind,
    name: &str,
) -> bool {
    parse_references(annotations, kind).iter().any(|n| n == name)
}

/// Whether the workload declares any configuration reference at all.
pub fn has_references(annotations: Option<&BTreeMap<String, String>>) -> bool {
    [ConfigKind::ConfigMap, ConfigKind::Secret].iter().any(|kind| {
        annotations
            .and_then(|a| a.get(kind.annotation()))
            .is_some_and(|v| !v.is_empty())
    })
}

/// Whether `name` is a valid ConfigMap/Secret name (RFC 1123 subdomain).
///
/// - 1 to 253 characters
/// - dot-separated labels of lowercase alphanumerics and hyphens
/// - each label starts and ends with an alphanumeric
pub fn is_valid_object_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    name.split('.').all(|label| {
        let alphanumeric = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        match (label.chars().next(), label.chars().last()) {
            (Some(first), Some(last)) if alphanumeric(first) && alphanumeric(last) => {
                label.chars().all(|c| alphanumeric(c) || c == '-')
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_references_absent() {
        assert!(parse_references(None, ConfigKind::ConfigMap).is_empty());
        let a = annotated(&[("other", "x")]);
        assert!(parse_references(Some(&a), ConfigKind::Secret).is_empty());
    }

    #[test]
    fn test_parse_references_empty_value() {
        let a = annotated(&[(annotations::CONFIG_MAPS, "")]);
        assert!(parse_references(Some(&a), ConfigKind::ConfigMap).is_empty());
    }

    #[test]
    fn test_parse_references_keeps_order_and_duplicates() {
        let a = annotated(&[(annotations::SECRETS, "b,a,b")]);
        assert_eq!(
            parse_references(Some(&a), ConfigKind::Secret),
            vec!["b", "a", "b"]
        );
        assert!(parse_references(Some(&a), ConfigKind::ConfigMap).is_empty());
    }

    #[test]
    fn test_references_exact_match_only() {
        let a = annotated(&[(annotations::CONFIG_MAPS, "app-config,shared")]);

        assert!(references(Some(&a), ConfigKind::ConfigMap, "shared"));
        assert!(references(Some(&a), ConfigKind::ConfigMap, "app-config"));
        assert!(!references(Some(&a), ConfigKind::ConfigMap, "app"));
        assert!(!references(Some(&a), ConfigKind::ConfigMap, "shared-extra"));
        assert!(!references(Some(&a), ConfigKind::Secret, "shared"));
    }

    #[test]
    fn test_has_references() {
        assert!(!has_references(None));
        assert!(!has_references(Some(&annotated(&[
            (annotations::CONFIG_MAPS, ""),
            (annotations::SECRETS, ""),
        ]))));
        assert!(has_references(Some(&annotated(&[(annotations::SECRETS, "db")]))));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ConfigKind::ConfigMap.prefix(), "configmap");
        assert_eq!(ConfigKind::Secret.prefix(), "secret");
        assert_eq!(ConfigKind::ConfigMap.to_string(), "ConfigMap");
        assert_eq!(ConfigKind::Secret.annotation(), annotations::SECRETS);
    }

    #[test]
    fn test_valid_object_names() {
        for name in ["app", "app-config", "a", "tls.example.com", "0config", &"a".repeat(253)] {
            assert!(is_valid_object_name(name), "{name}");
        }
    }

    #[test]
    fn test_invalid_object_names() {
        for name in [
            "", " db", "a b", "app?x=1", "app#frag", "App", "-app", "app-", ".app", "app..x", "app/x",
            &"a".repeat(254),
        ] {
            assert!(!is_valid_object_name(name), "{name:?}");
        }
    }
}
