//! Proxy providers: sources of endpoints that groups route through.
//!
//! Three kinds exist and the set is closed:
//!
//! - [`ProxySetProvider`]: a dynamic pool whose members can be replaced at
//!   runtime. The only kind a group may list under `use`.
//! - [`CompatibleProvider`]: a fixed list of endpoints synthesized for a
//!   group's inline `proxies`.
//! - [`FilterProvider`]: a view over one pool, narrowed by a name pattern and
//!   owned by the group that derived it.

pub mod compatible;
pub mod filter;
pub mod proxy_set;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::health::HealthCheck;
use crate::proxy::ProxyRef;

pub use compatible::CompatibleProvider;
pub use filter::FilterProvider;
pub use proxy_set::ProxySetProvider;
pub use registry::ProviderRegistry;

/// How a provider obtains its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    File,
    Http,
    Inline,
    Compatible,
}

pub trait ProxyProvider: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn vehicle_type(&self) -> VehicleType;

    /// Current members, in provider order.
    fn proxies(&self) -> Vec<ProxyRef>;

    fn health_check(&self) -> &HealthCheck;

    /// Mark the provider as in use so lazy health checks start probing.
    fn touch(&self) {
        self.health_check().touch();
    }
}

/// A shared handle to any provider kind.
#[derive(Debug, Clone)]
pub enum ProviderHandle {
    ProxySet(Arc<ProxySetProvider>),
    Compatible(Arc<CompatibleProvider>),
    Filter(Arc<FilterProvider>),
}

impl ProviderHandle {
    pub fn as_provider(&self) -> &dyn ProxyProvider {
        match self {
            ProviderHandle::ProxySet(p) => p.as_ref(),
            ProviderHandle::Compatible(p) => p.as_ref(),
            ProviderHandle::Filter(p) => p.as_ref(),
        }
    }

    pub fn name(&self) -> &str {
        self.as_provider().name()
    }

    pub fn proxies(&self) -> Vec<ProxyRef> {
        self.as_provider().proxies()
    }

    pub fn health_check(&self) -> &HealthCheck {
        self.as_provider().health_check()
    }

    /// The dynamic pool behind this handle, if it is one.
    pub fn as_proxy_set(&self) -> Option<&Arc<ProxySetProvider>> {
        match self {
            ProviderHandle::ProxySet(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Arc<ProxySetProvider>> for ProviderHandle {
    fn from(provider: Arc<ProxySetProvider>) -> Self {
        ProviderHandle::ProxySet(provider)
    }
}

impl From<Arc<CompatibleProvider>> for ProviderHandle {
    fn from(provider: Arc<CompatibleProvider>) -> Self {
        ProviderHandle::Compatible(provider)
    }
}

impl From<Arc<FilterProvider>> for ProviderHandle {
    fn from(provider: Arc<FilterProvider>) -> Self {
        ProviderHandle::Filter(provider)
    }
}
