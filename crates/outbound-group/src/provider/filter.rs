//! Group-scoped view over a dynamic pool.

use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

use crate::health::{HealthCheck, HealthCheckPolicy};
use crate::proxy::ProxyRef;

use super::{ProxyProvider, ProxySetProvider, VehicleType};

/// Members of a parent pool whose names match `filter` (all of them when
/// there is no filter). Refreshed by the parent on every update.
#[derive(Debug)]
pub struct FilterProvider {
    name: String,
    parent: Arc<ProxySetProvider>,
    filter: Option<Regex>,
    health_check: HealthCheck,
    proxies: RwLock<Vec<ProxyRef>>,
}

impl FilterProvider {
    /// Derive a view named `name` over `parent`. The caller registers it with
    /// the parent once the owning group is committed.
    pub fn new(
        name: impl Into<String>,
        parent: Arc<ProxySetProvider>,
        filter: Option<Regex>,
        policy: HealthCheckPolicy,
    ) -> Arc<Self> {
        let proxies = apply_filter(filter.as_ref(), &parent.proxies());
        Arc::new(Self {
            name: name.into(),
            parent,
            filter,
            health_check: HealthCheck::new(policy, proxies.clone()),
            proxies: RwLock::new(proxies),
        })
    }

    /// `"<source>-in-<group>"`.
    pub fn derived_name(source: &str, group: &str) -> String {
        format!("{source}-in-{group}")
    }

    pub fn parent(&self) -> &Arc<ProxySetProvider> {
        &self.parent
    }

    pub fn filter(&self) -> Option<&Regex> {
        self.filter.as_ref()
    }

    /// Re-apply the filter to a new parent member set.
    pub fn refresh(&self, parent_proxies: &[ProxyRef]) {
        let proxies = apply_filter(self.filter.as_ref(), parent_proxies);
        self.health_check.set_proxies(proxies.clone());
        *self.proxies.write() = proxies;
    }
}

fn apply_filter(filter: Option<&Regex>, proxies: &[ProxyRef]) -> Vec<ProxyRef> {
    match filter {
        Some(regex) => proxies
            .iter()
            .filter(|proxy| regex.is_match(proxy.name()))
            .cloned()
            .collect(),
        None => proxies.to_vec(),
    }
}

impl ProxyProvider for FilterProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn vehicle_type(&self) -> VehicleType {
        VehicleType::Compatible
    }

    fn proxies(&self) -> Vec<ProxyRef> {
        self.proxies.read().clone()
    }

    fn health_check(&self) -> &HealthCheck {
        &self.health_check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::StaticProxy;

    fn pool(names: &[&str]) -> Arc<ProxySetProvider> {
        ProxySetProvider::new(
            "airport",
            VehicleType::Http,
            HealthCheckPolicy::disabled(),
            names
                .iter()
                .map(|name| StaticProxy::shared(*name, "Vmess", true))
                .collect(),
        )
    }

    fn names_of(provider: &FilterProvider) -> Vec<String> {
        provider
            .proxies()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    #[test]
    fn test_filter_narrows_members() {
        let parent = pool(&["HK 01", "JP 01", "hk 02"]);
        let fp = FilterProvider::new(
            FilterProvider::derived_name("airport", "asia"),
            parent,
            Some(Regex::new("(?i)hk").unwrap()),
            HealthCheckPolicy::disabled(),
        );
        assert_eq!(fp.name(), "airport-in-asia");
        assert_eq!(fp.filter().map(Regex::as_str), Some("(?i)hk"));
        assert_eq!(names_of(&fp), vec!["HK 01", "hk 02"]);
        assert_eq!(fp.health_check().proxies().len(), 2);
    }

    #[test]
    fn test_no_filter_passes_through() {
        let parent = pool(&["a", "b"]);
        let fp = FilterProvider::new(
            "airport-in-g",
            parent,
            None,
            HealthCheckPolicy::disabled(),
        );
        assert_eq!(names_of(&fp), vec!["a", "b"]);
        assert_eq!(fp.vehicle_type(), VehicleType::Compatible);
    }

    #[test]
    fn test_parent_update_refreshes_registered_view() {
        let parent = pool(&["HK 01"]);
        let fp = FilterProvider::new(
            "airport-in-asia",
            parent.clone(),
            Some(Regex::new("HK").unwrap()),
            HealthCheckPolicy::disabled(),
        );
        parent.register_dependent(&fp);

        parent.update(
            ["HK 01", "HK 02", "US 01"]
                .iter()
                .map(|name| StaticProxy::shared(*name, "Vmess", true))
                .collect(),
        );
        assert_eq!(names_of(&fp), vec!["HK 01", "HK 02"]);
        assert_eq!(fp.health_check().proxies().len(), 2);
    }

    #[test]
    fn test_unregistered_view_is_not_refreshed() {
        let parent = pool(&["HK 01"]);
        let fp = FilterProvider::new(
            "airport-in-g",
            parent.clone(),
            None,
            HealthCheckPolicy::disabled(),
        );
        parent.update(Vec::new());
        assert_eq!(names_of(&fp), vec!["HK 01"]);
    }
}
