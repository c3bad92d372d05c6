//! Fixed provider wrapping a group's inline `proxies`.

use crate::error::GroupError;
use crate::health::{HealthCheck, HealthCheckPolicy};
use crate::proxy::ProxyRef;

use super::{ProxyProvider, VehicleType};

#[derive(Debug)]
pub struct CompatibleProvider {
    name: String,
    proxies: Vec<ProxyRef>,
    health_check: HealthCheck,
}

impl CompatibleProvider {
    /// Needs at least one proxy.
    pub fn new(
        name: impl Into<String>,
        proxies: Vec<ProxyRef>,
        policy: HealthCheckPolicy,
    ) -> Result<Self, GroupError> {
        if proxies.is_empty() {
            return Err(GroupError::MissingProxies);
        }
        Ok(Self {
            name: name.into(),
            health_check: HealthCheck::new(policy, proxies.clone()),
            proxies,
        })
    }
}

impl ProxyProvider for CompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn vehicle_type(&self) -> VehicleType {
        VehicleType::Compatible
    }

    fn proxies(&self) -> Vec<ProxyRef> {
        self.proxies.clone()
    }

    fn health_check(&self) -> &HealthCheck {
        &self.health_check
    }
}
