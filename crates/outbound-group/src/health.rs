//! Health-check policies and the per-provider health check.
//!
//! The probing loop itself runs elsewhere; this module decides what it
//! should probe, where and how often.

use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::error::GroupError;
use crate::group::GroupType;
use crate::options::GroupOptions;
use crate::proxy::ProxyRef;

/// Where and how often to probe. An empty URL disables probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckPolicy {
    pub url: String,
    pub interval_secs: u64,
    /// Defer probing until the group is first consulted for routing.
    pub lazy: bool,
}

impl HealthCheckPolicy {
    /// The no-op policy used by groups that never rank their members.
    pub fn disabled() -> Self {
        Self {
            url: String::new(),
            interval_secs: 0,
            lazy: true,
        }
    }

    /// Pick the policy a group of this kind needs.
    ///
    /// `select` and `relay` always get the disabled policy. Every other kind
    /// (including kinds not yet recognised) needs both `url` and `interval`.
    pub fn for_group(options: &GroupOptions) -> Result<Self, GroupError> {
        match options.kind() {
            Some(GroupType::Select) | Some(GroupType::Relay) => Ok(Self::disabled()),
            _ => {
                if options.url.is_empty() || options.interval == 0 {
                    return Err(GroupError::MissingHealthCheck);
                }
                Ok(Self {
                    url: options.url.clone(),
                    interval_secs: options.interval,
                    lazy: options.lazy,
                })
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// A policy bound to the set of proxies it evaluates. Owned by one provider.
#[derive(Debug)]
pub struct HealthCheck {
    policy: HealthCheckPolicy,
    proxies: RwLock<Vec<ProxyRef>>,
    last_touch: Mutex<Option<Instant>>,
}

impl HealthCheck {
    pub fn new(policy: HealthCheckPolicy, proxies: Vec<ProxyRef>) -> Self {
        Self {
            policy,
            proxies: RwLock::new(proxies),
            last_touch: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &HealthCheckPolicy {
        &self.policy
    }

    pub fn proxies(&self) -> Vec<ProxyRef> {
        self.proxies.read().clone()
    }

    pub fn set_proxies(&self, proxies: Vec<ProxyRef>) {
        *self.proxies.write() = proxies;
    }

    /// Record that the owning group was consulted for routing.
    pub fn touch(&self) {
        *self.last_touch.lock() = Some(Instant::now());
    }

    pub fn last_touched(&self) -> Option<Instant> {
        *self.last_touch.lock()
    }

    /// Whether a probe round due at `now` should run.
    pub fn should_probe_at(&self, now: Instant) -> bool {
        if !self.policy.is_enabled() {
            return false;
        }
        if !self.policy.lazy {
            return true;
        }
        match self.last_touched() {
            Some(touched) => now.saturating_duration_since(touched) < self.policy.interval(),
            None => false,
        }
    }
}
