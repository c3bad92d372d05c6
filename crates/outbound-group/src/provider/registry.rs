//! Provider name to handle, shared by every group of one load pass.

use std::collections::HashMap;

use crate::error::GroupError;
use crate::proxy::resolve_refs;

use super::ProviderHandle;

/// Entries are only ever added. Registration is check-then-set and callers
/// serialize access (`&mut self`), so a name is never registered twice.
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderHandle>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ProviderHandle> {
        self.providers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Add a provider under its own name.
    pub fn register(&mut self, provider: ProviderHandle) -> Result<(), GroupError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(GroupError::DuplicateProvider(name));
        }
        tracing::debug!(provider = %name, "Registered provider");
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn resolve(&self, names: &[String]) -> Result<Vec<ProviderHandle>, GroupError> {
        resolve_refs(names, |name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthCheckPolicy;
    use crate::provider::{ProxySetProvider, VehicleType};

    fn pool(name: &str) -> ProviderHandle {
        ProxySetProvider::new(
            name,
            VehicleType::Inline,
            HealthCheckPolicy::disabled(),
            Vec::new(),
        )
        .into()
    }

    #[test]
    fn test_register_rejects_duplicate_names() {
        let mut registry = ProviderRegistry::new();
        registry.register(pool("airport")).unwrap();
        let err = registry.register(pool("airport")).unwrap_err();
        assert!(matches!(err, GroupError::DuplicateProvider(ref n) if n == "airport"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_fails_fast() {
        let mut registry = ProviderRegistry::new();
        registry.register(pool("a")).unwrap();
        registry.register(pool("b")).unwrap();

        let names = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let resolved = registry.resolve(&names).unwrap();
        let got: Vec<&str> = resolved.iter().map(|p| p.name()).collect();
        assert_eq!(got, vec!["b", "a", "b"]);

        let names = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        assert!(matches!(
            registry.resolve(&names),
            Err(GroupError::NotFound(ref n)) if n == "c"
        ));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
