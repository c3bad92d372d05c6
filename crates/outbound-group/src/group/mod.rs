//! Proxy group adapters.
//!
//! Every group holds an ordered list of providers (never raw endpoints) and
//! exposes the same [`GroupAdapter`] capability. [`ProxyGroup`] is the closed
//! set of kinds the resolver can build.

pub mod fallback;
pub mod load_balance;
pub mod relay;
pub mod selector;

use serde::{Deserialize, Serialize};

use crate::health::HealthCheckPolicy;
use crate::options::{DialOptions, GroupOptions};
use crate::provider::ProviderHandle;
use crate::proxy::{Proxy, ProxyRef};

pub use fallback::Fallback;
pub use load_balance::{LoadBalance, Strategy};
pub use relay::Relay;
pub use selector::Selector;
pub use url_test::UrlTest;

/// Group strategy kind, as written in the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupType {
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "url-test")]
    UrlTest,
    #[serde(rename = "fallback")]
    Fallback,
    #[serde(rename = "load-balance")]
    LoadBalance,
    #[serde(rename = "relay")]
    Relay,
}

impl GroupType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "select" => Some(GroupType::Select),
            "url-test" => Some(GroupType::UrlTest),
            "fallback" => Some(GroupType::Fallback),
            "load-balance" => Some(GroupType::LoadBalance),
            "relay" => Some(GroupType::Relay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Select => "select",
            GroupType::UrlTest => "url-test",
            GroupType::Fallback => "fallback",
            GroupType::LoadBalance => "load-balance",
            GroupType::Relay => "relay",
        }
    }

    /// Adapter kind reported when the group is used as a proxy.
    pub fn adapter_kind(&self) -> &'static str {
        match self {
            GroupType::Select => "Selector",
            GroupType::UrlTest => "URLTest",
            GroupType::Fallback => "Fallback",
            GroupType::LoadBalance => "LoadBalance",
            GroupType::Relay => "Relay",
        }
    }
}

/// State shared by every group kind.
#[derive(Debug)]
pub struct GroupBase {
    name: String,
    providers: Vec<ProviderHandle>,
    dial: DialOptions,
    disable_udp: bool,
    disable_dns: bool,
}

impl GroupBase {
    pub fn new(options: &GroupOptions, providers: Vec<ProviderHandle>) -> Self {
        Self {
            name: options.name.clone(),
            providers,
            dial: options.dial_options(),
            disable_udp: options.disable_udp,
            disable_dns: options.disable_dns,
        }
    }

    /// Members of every provider, in provider order. With `touch`, lazy
    /// health checks of the providers are woken up.
    pub fn candidates(&self, touch: bool) -> Vec<ProxyRef> {
        self.providers
            .iter()
            .flat_map(|provider| {
                if touch {
                    provider.as_provider().touch();
                }
                provider.proxies()
            })
            .collect()
    }
}

/// The route-selectable capability every group kind provides.
pub trait GroupAdapter: Send + Sync {
    fn base(&self) -> &GroupBase;

    fn group_type(&self) -> GroupType;

    /// The policy the group was configured with; `None` for kinds that never
    /// probe.
    fn health_policy(&self) -> Option<&HealthCheckPolicy>;

    /// The member traffic would currently be routed through.
    fn now(&self) -> Option<ProxyRef>;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn providers(&self) -> &[ProviderHandle] {
        &self.base().providers
    }

    fn candidates(&self) -> Vec<ProxyRef> {
        self.base().candidates(false)
    }

    fn dial_options(&self) -> &DialOptions {
        &self.base().dial
    }

    fn supports_udp(&self) -> bool {
        !self.base().disable_udp
    }

    fn disable_dns(&self) -> bool {
        self.base().disable_dns
    }
}

/// A resolved group of any kind.
#[derive(Debug)]
pub enum ProxyGroup {
    Selector(Selector),
    UrlTest(UrlTest),
    Fallback(Fallback),
    LoadBalance(LoadBalance),
    Relay(Relay),
}

impl ProxyGroup {
    pub fn as_adapter(&self) -> &dyn GroupAdapter {
        match self {
            ProxyGroup::Selector(g) => g,
            ProxyGroup::UrlTest(g) => g,
            ProxyGroup::Fallback(g) => g,
            ProxyGroup::LoadBalance(g) => g,
            ProxyGroup::Relay(g) => g,
        }
    }

    pub fn name(&self) -> &str {
        self.as_adapter().name()
    }

    pub fn group_type(&self) -> GroupType {
        self.as_adapter().group_type()
    }

    pub fn providers(&self) -> &[ProviderHandle] {
        self.as_adapter().providers()
    }

    pub fn health_policy(&self) -> Option<&HealthCheckPolicy> {
        self.as_adapter().health_policy()
    }

    pub fn candidates(&self) -> Vec<ProxyRef> {
        self.as_adapter().candidates()
    }

    pub fn now(&self) -> Option<ProxyRef> {
        self.as_adapter().now()
    }
}

impl Proxy for ProxyGroup {
    fn name(&self) -> &str {
        self.as_adapter().name()
    }

    fn kind(&self) -> &str {
        self.group_type().adapter_kind()
    }

    fn supports_udp(&self) -> bool {
        self.as_adapter().supports_udp()
    }
}
