//! First alive member, in priority order.

use crate::health::HealthCheckPolicy;
use crate::options::GroupOptions;
use crate::provider::ProviderHandle;
use crate::proxy::ProxyRef;

use super::{GroupAdapter, GroupBase, GroupType};

#[derive(Debug)]
pub struct Fallback {
    base: GroupBase,
    policy: HealthCheckPolicy,
}

impl Fallback {
    pub fn new(
        options: &GroupOptions,
        providers: Vec<ProviderHandle>,
        policy: HealthCheckPolicy,
    ) -> Self {
        Self {
            base: GroupBase::new(options, providers),
            policy,
        }
    }

    /// The first member `alive` accepts, or the first member if none is.
    pub fn find_alive(&self, alive: impl Fn(&ProxyRef) -> bool) -> Option<ProxyRef> {
        let candidates = self.base.candidates(true);
        candidates
            .iter()
            .find(|p| alive(p))
            .or_else(|| candidates.first())
            .cloned()
    }
}

impl GroupAdapter for Fallback {
    fn base(&self) -> &GroupBase {
        &self.base
    }

    fn group_type(&self) -> GroupType {
        GroupType::Fallback
    }

    fn health_policy(&self) -> Option<&HealthCheckPolicy> {
        Some(&self.policy)
    }

    fn now(&self) -> Option<ProxyRef> {
        self.find_alive(|_| true)
    }
}
