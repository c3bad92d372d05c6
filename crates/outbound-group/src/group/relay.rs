//! Members chained hop by hop.

use crate::health::HealthCheckPolicy;
use crate::options::GroupOptions;
use crate::provider::ProviderHandle;
use crate::proxy::ProxyRef;

use super::{GroupAdapter, GroupBase, GroupType};

#[derive(Debug)]
pub struct Relay {
    base: GroupBase,
}

impl Relay {
    pub fn new(options: &GroupOptions, providers: Vec<ProviderHandle>) -> Self {
        Self {
            base: GroupBase::new(options, providers),
        }
    }

    /// Hops in dial order: the first member is dialled directly, each later
    /// one through the previous.
    pub fn chain(&self) -> Vec<ProxyRef> {
        self.base.candidates(true)
    }
}

impl GroupAdapter for Relay {
    fn base(&self) -> &GroupBase {
        &self.base
    }

    fn group_type(&self) -> GroupType {
        GroupType::Relay
    }

    fn health_policy(&self) -> Option<&HealthCheckPolicy> {
        None
    }

    /// The exit hop.
    fn now(&self) -> Option<ProxyRef> {
        self.chain().last().cloned()
    }

    fn supports_udp(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{options, provider};
    use super::*;
    use crate::proxy::Proxy;

    #[test]
    fn test_chain_keeps_order_and_drops_udp() {
        let relay = Relay::new(
            &options("chain", "relay"),
            vec![provider("chain", &["entry", "middle", "exit"])],
        );
        let hops: Vec<String> = relay.chain().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(hops, vec!["entry", "middle", "exit"]);
        assert_eq!(relay.now().unwrap().name(), "exit");
        assert!(!relay.supports_udp());
        assert!(relay.health_policy().is_none());
    }
}
