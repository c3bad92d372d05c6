//! Traffic spread across all members.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::error::GroupError;
use crate::health::HealthCheckPolicy;
use crate::options::GroupOptions;
use crate::provider::ProviderHandle;
use crate::proxy::ProxyRef;

use super::{GroupAdapter, GroupBase, GroupType};

/// How connections are distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// The same key always lands on the same member while the member set is
    /// unchanged.
    #[default]
    ConsistentHashing,
    RoundRobin,
}

impl Strategy {
    /// `None` selects the default strategy.
    pub fn parse(s: Option<&str>) -> Result<Self, GroupError> {
        match s {
            None | Some("consistent-hashing") => Ok(Strategy::ConsistentHashing),
            Some("round-robin") => Ok(Strategy::RoundRobin),
            Some(other) => Err(GroupError::UnsupportedStrategy(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ConsistentHashing => "consistent-hashing",
            Strategy::RoundRobin => "round-robin",
        }
    }
}

#[derive(Debug)]
pub struct LoadBalance {
    base: GroupBase,
    policy: HealthCheckPolicy,
    strategy: Strategy,
    cursor: AtomicUsize,
}

impl LoadBalance {
    /// Fails when `strategy` names an unknown strategy.
    pub fn new(
        options: &GroupOptions,
        providers: Vec<ProviderHandle>,
        policy: HealthCheckPolicy,
        strategy: Option<&str>,
    ) -> Result<Self, GroupError> {
        Ok(Self {
            base: GroupBase::new(options, providers),
            policy,
            strategy: Strategy::parse(strategy)?,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Pick a member for a connection identified by `key` (usually the
    /// destination host).
    pub fn pick(&self, key: &str) -> Option<ProxyRef> {
        let candidates = self.base.candidates(true);
        if candidates.is_empty() {
            return None;
        }
        let index = match self.strategy {
            Strategy::RoundRobin => self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len(),
            Strategy::ConsistentHashing => jump_hash(fnv1a(key), candidates.len()),
        };
        candidates.get(index).cloned()
    }
}

impl GroupAdapter for LoadBalance {
    fn base(&self) -> &GroupBase {
        &self.base
    }

    fn group_type(&self) -> GroupType {
        GroupType::LoadBalance
    }

    fn health_policy(&self) -> Option<&HealthCheckPolicy> {
        Some(&self.policy)
    }

    fn now(&self) -> Option<ProxyRef> {
        self.pick("")
    }
}

fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Jump consistent hash (Lamping & Veach).
fn jump_hash(mut key: u64, buckets: usize) -> usize {
    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < buckets as i64 {
        b = j;
        key = key.wrapping_mul(2_862_933_555_777_941_757).wrapping_add(1);
        j = ((b + 1) as f64 * ((1_u64 << 31) as f64 / ((key >> 33) + 1) as f64)) as i64;
    }
    b as usize
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{options, provider};
    use super::*;
    use crate::proxy::Proxy;

    fn group(strategy: Option<&str>) -> LoadBalance {
        LoadBalance::new(
            &options("lb", "load-balance"),
            vec![provider("p", &["a", "b", "c"])],
            HealthCheckPolicy::disabled(),
            strategy,
        )
        .unwrap()
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(Strategy::parse(None).unwrap(), Strategy::ConsistentHashing);
        assert_eq!(
            Strategy::parse(Some("round-robin")).unwrap(),
            Strategy::RoundRobin
        );
        assert!(matches!(
            Strategy::parse(Some("sticky-sessions")),
            Err(GroupError::UnsupportedStrategy(ref s)) if s == "sticky-sessions"
        ));
    }

    #[test]
    fn test_round_robin_cycles() {
        let lb = group(Some("round-robin"));
        let picked: Vec<String> = (0..4)
            .map(|_| lb.pick("example.com").unwrap().name().to_string())
            .collect();
        assert_eq!(picked, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_consistent_hashing_is_stable_per_key() {
        let lb = group(None);
        let first = lb.pick("example.com").unwrap();
        for _ in 0..5 {
            assert_eq!(lb.pick("example.com").unwrap().name(), first.name());
        }
    }

    #[test]
    fn test_jump_hash_stays_in_range() {
        for key in 0..1000_u64 {
            assert!(jump_hash(key, 7) < 7);
        }
        assert_eq!(jump_hash(42, 1), 0);
    }
}
