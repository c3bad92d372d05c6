//! Manually selected member.

use parking_lot::Mutex;

use crate::health::HealthCheckPolicy;
use crate::options::GroupOptions;
use crate::provider::ProviderHandle;
use crate::proxy::{Proxy, ProxyRef};

use super::{GroupAdapter, GroupBase, GroupType};

#[derive(Debug)]
pub struct Selector {
    base: GroupBase,
    selected: Mutex<String>,
}

impl Selector {
    /// Starts out selecting the first member.
    pub fn new(options: &GroupOptions, providers: Vec<ProviderHandle>) -> Self {
        let base = GroupBase::new(options, providers);
        let selected = base
            .candidates(false)
            .first()
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        Self {
            base,
            selected: Mutex::new(selected),
        }
    }

    pub fn selected(&self) -> String {
        self.selected.lock().clone()
    }

    /// Switch to the member called `name`. Returns false if no provider has it.
    pub fn select(&self, name: &str) -> bool {
        let known = self.base.candidates(false).iter().any(|p| p.name() == name);
        if known {
            *self.selected.lock() = name.to_string();
        }
        known
    }
}

impl GroupAdapter for Selector {
    fn base(&self) -> &GroupBase {
        &self.base
    }

    fn group_type(&self) -> GroupType {
        GroupType::Select
    }

    fn health_policy(&self) -> Option<&HealthCheckPolicy> {
        None
    }

    fn now(&self) -> Option<ProxyRef> {
        let selected = self.selected();
        let candidates = self.base.candidates(false);
        candidates
            .iter()
            .find(|p| p.name() == selected)
            .or_else(|| candidates.first())
            .cloned()
    }
}
