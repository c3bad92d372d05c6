//! outbound-group: turns proxy-group configuration records into routing
//! group adapters.
//!
//! A group record names a strategy (`select`, `url-test`, `fallback`,
//! `load-balance`, `relay`), lists endpoints directly (`proxies`) and/or
//! pulls them from dynamic pools (`use`). [`resolve_group`] validates one
//! record against an endpoint registry and a provider registry and returns
//! the matching [`ProxyGroup`]. [`loader::LoadPass`] drives a whole
//! configuration in dependency order.
//!
//! Groups must be resolved so that every group appears after the groups it
//! lists in `proxies`; [`loader::order_groups`] computes such an order.

pub mod error;
pub mod group;
pub mod health;
pub mod loader;
pub mod options;
pub mod provider;
pub mod proxy;
pub mod report;
pub mod resolver;

pub use error::{ErrorKind, GroupError, ResolveError};
pub use group::{GroupAdapter, GroupType, ProxyGroup};
pub use health::{HealthCheck, HealthCheckPolicy};
pub use options::GroupOptions;
pub use provider::{ProviderHandle, ProviderRegistry, ProxyProvider};
pub use proxy::{Proxy, ProxyRef, ProxyRegistry, StaticProxy};
pub use resolver::resolve_group;
