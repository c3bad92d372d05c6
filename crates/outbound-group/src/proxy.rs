//! Proxy endpoint handles and the endpoint registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::GroupError;

/// A resolved outbound endpoint. Endpoints are built elsewhere; groups only
/// hold handles to them.
pub trait Proxy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Protocol or adapter kind, e.g. `"Shadowsocks"` or `"Selector"`.
    fn kind(&self) -> &str;

    fn supports_udp(&self) -> bool {
        true
    }
}

pub type ProxyRef = Arc<dyn Proxy>;

/// A plain endpoint handle carrying only identity and capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProxy {
    name: String,
    kind: String,
    udp: bool,
}

impl StaticProxy {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, udp: bool) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            udp,
        }
    }

    pub fn shared(name: impl Into<String>, kind: impl Into<String>, udp: bool) -> ProxyRef {
        Arc::new(Self::new(name, kind, udp))
    }
}

impl Proxy for StaticProxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn supports_udp(&self) -> bool {
        self.udp
    }
}

/// Look every name up in order, keeping duplicates. Fails on the first name
/// that `lookup` does not know.
pub fn resolve_refs<T>(
    names: &[String],
    lookup: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, GroupError> {
    names
        .iter()
        .map(|name| lookup(name).ok_or_else(|| GroupError::NotFound(name.clone())))
        .collect()
}

/// Endpoint name to handle. Read-only while a group resolves; the load pass
/// adds each resolved group so later groups can list it.
#[derive(Debug, Default, Clone)]
pub struct ProxyRegistry {
    proxies: HashMap<String, ProxyRef>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the endpoint under its own name.
    pub fn insert(&mut self, proxy: ProxyRef) -> Option<ProxyRef> {
        self.proxies.insert(proxy.name().to_string(), proxy)
    }

    pub fn get(&self, name: &str) -> Option<ProxyRef> {
        self.proxies.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.proxies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn resolve(&self, names: &[String]) -> Result<Vec<ProxyRef>, GroupError> {
        resolve_refs(names, |name| self.get(name))
    }
}

impl FromIterator<ProxyRef> for ProxyRegistry {
    fn from_iter<I: IntoIterator<Item = ProxyRef>>(iter: I) -> Self {
        let mut registry = ProxyRegistry::new();
        for proxy in iter {
            registry.insert(proxy);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> ProxyRegistry {
        ["hk-01", "jp-01", "us-01"]
            .into_iter()
            .map(|name| StaticProxy::shared(name, "Shadowsocks", true))
            .collect()
    }

    #[test]
    fn test_resolve_preserves_order_and_duplicates() {
        let resolved = registry()
            .resolve(&names(&["us-01", "hk-01", "us-01"]))
            .unwrap();
        let got: Vec<&str> = resolved.iter().map(|p| p.name()).collect();
        assert_eq!(got, vec!["us-01", "hk-01", "us-01"]);
    }

    #[test]
    fn test_resolve_reports_first_missing_name() {
        let err = registry()
            .resolve(&names(&["hk-01", "sg-01", "tw-01"]))
            .unwrap_err();
        assert!(matches!(err, GroupError::NotFound(ref name) if name == "sg-01"));
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut registry = registry();
        let previous = registry.insert(StaticProxy::shared("hk-01", "Vmess", false));
        assert_eq!(previous.map(|p| p.kind().to_string()).as_deref(), Some("Shadowsocks"));
        assert_eq!(registry.len(), 3);
        assert!(!registry.get("hk-01").unwrap().supports_udp());
    }
}
