//! Dynamic endpoint pool.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::health::{HealthCheck, HealthCheckPolicy};
use crate::proxy::ProxyRef;

use super::{FilterProvider, ProxyProvider, VehicleType};

/// A provider whose member set is refreshed at runtime (subscription file,
/// remote URL, ...). Filter providers derived from it are tracked weakly and
/// refreshed whenever the set changes.
#[derive(Debug)]
pub struct ProxySetProvider {
    name: String,
    vehicle: VehicleType,
    health_check: HealthCheck,
    proxies: RwLock<Vec<ProxyRef>>,
    dependents: Mutex<Vec<Weak<FilterProvider>>>,
}

impl ProxySetProvider {
    pub fn new(
        name: impl Into<String>,
        vehicle: VehicleType,
        policy: HealthCheckPolicy,
        proxies: Vec<ProxyRef>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            vehicle,
            health_check: HealthCheck::new(policy, proxies.clone()),
            proxies: RwLock::new(proxies),
            dependents: Mutex::new(Vec::new()),
        })
    }

    /// Replace the member set and refresh every live dependent.
    ///
    /// The dependents lock is held for the whole update, so concurrent
    /// updates reach the dependents in the order they reach the member set.
    pub fn update(&self, proxies: Vec<ProxyRef>) {
        let mut dependents = self.dependents.lock();
        *self.proxies.write() = proxies.clone();
        self.health_check.set_proxies(proxies.clone());

        let live = prune(&mut dependents);
        tracing::debug!(
            provider = %self.name,
            members = proxies.len(),
            dependents = live.len(),
            "Proxy set updated"
        );
        for dependent in live {
            dependent.refresh(&proxies);
        }
    }

    /// Track a derived provider and bring it up to date with the current
    /// members. The pool does not keep it alive.
    pub fn register_dependent(&self, dependent: &Arc<FilterProvider>) {
        let mut dependents = self.dependents.lock();
        dependent.refresh(&self.proxies.read());
        dependents.push(Arc::downgrade(dependent));
    }

    /// Dependents that are still alive. Dropped ones are pruned.
    pub fn live_dependents(&self) -> Vec<Arc<FilterProvider>> {
        prune(&mut self.dependents.lock())
    }
}

fn prune(dependents: &mut Vec<Weak<FilterProvider>>) -> Vec<Arc<FilterProvider>> {
    dependents.retain(|weak| weak.strong_count() > 0);
    dependents.iter().filter_map(Weak::upgrade).collect()
}

impl ProxyProvider for ProxySetProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn vehicle_type(&self) -> VehicleType {
        self.vehicle
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
    use crate::proxy::{Proxy, StaticProxy};

    fn members(names: &[&str]) -> Vec<ProxyRef> {
        names
            .iter()
            .map(|name| StaticProxy::shared(*name, "Trojan", true))
            .collect()
    }

    #[test]
    fn test_update_replaces_members_and_health_set() {
        let pool = ProxySetProvider::new(
            "airport",
            VehicleType::Http,
            HealthCheckPolicy::disabled(),
            members(&["hk-01"]),
        );
        assert_eq!(pool.proxies().len(), 1);

        pool.update(members(&["hk-01", "jp-01"]));
        assert_eq!(pool.proxies().len(), 2);
        assert_eq!(pool.health_check().proxies().len(), 2);
        assert_eq!(pool.vehicle_type(), VehicleType::Http);
    }

    #[test]
    fn test_concurrent_updates_leave_views_consistent() {
        let pool = ProxySetProvider::new(
            "airport",
            VehicleType::Http,
            HealthCheckPolicy::disabled(),
            Vec::new(),
        );
        let view = FilterProvider::new(
            "airport-in-g",
            pool.clone(),
            None,
            HealthCheckPolicy::disabled(),
        );
        pool.register_dependent(&view);

        std::thread::scope(|scope| {
            for round in 0..8 {
                let pool = &pool;
                scope.spawn(move || {
                    for step in 0..50 {
                        pool.update(members(&[format!("node-{round}-{step}").as_str()]));
                    }
                });
            }
        });

        let names = |proxies: Vec<ProxyRef>| -> Vec<String> {
            proxies.iter().map(|p| p.name().to_string()).collect()
        };
        assert_eq!(names(view.proxies()), names(pool.proxies()));
        assert_eq!(names(view.health_check().proxies()), names(pool.proxies()));
    }

    #[test]
    fn test_late_registration_catches_up() {
        let pool = ProxySetProvider::new(
            "airport",
            VehicleType::Http,
            HealthCheckPolicy::disabled(),
            members(&["hk-01"]),
        );
        let view = FilterProvider::new(
            "airport-in-g",
            pool.clone(),
            None,
            HealthCheckPolicy::disabled(),
        );
        pool.update(members(&["hk-01", "jp-01"]));
        assert_eq!(view.proxies().len(), 1);

        pool.register_dependent(&view);
        assert_eq!(view.proxies().len(), 2);
    }

    #[test]
    fn test_dropped_dependents_are_pruned() {
        let pool = ProxySetProvider::new(
            "airport",
            VehicleType::File,
            HealthCheckPolicy::disabled(),
            members(&["hk-01", "us-01"]),
        );
        let view = |name: &str| {
            FilterProvider::new(name, pool.clone(), None, HealthCheckPolicy::disabled())
        };
        let kept = view("airport-in-a");
        let dropped = view("airport-in-b");
        pool.register_dependent(&kept);
        pool.register_dependent(&dropped);
        assert_eq!(pool.live_dependents().len(), 2);

        drop(dropped);
        let live = pool.live_dependents();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].name(), "airport-in-a");
    }
}
