//! Configuration types and loading logic for the dry-run binary.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use outbound_group::loader::OnError;
use outbound_group::options::GroupRecord;
use outbound_group::provider::{ProxySetProvider, VehicleType};
use outbound_group::{HealthCheckPolicy, ProviderRegistry, ProxyRef, ProxyRegistry, StaticProxy};
use outbound_tracing::TracingConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub tracing: TracingConfig,

    /// Endpoints that groups may list under `proxies`.
    #[serde(default)]
    pub proxies: Vec<EndpointConfig>,

    /// Dynamic pools that groups may list under `use`.
    #[serde(default)]
    pub proxy_providers: Vec<ProviderConfig>,

    /// Group records, kept untyped until the resolver binds them.
    #[serde(default)]
    pub proxy_groups: Vec<GroupRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoaderConfig {
    #[serde(default)]
    pub on_error: OnError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: String,

    #[serde(rename = "type", default = "default_endpoint_type")]
    pub kind: String,

    #[serde(default = "default_true")]
    pub udp: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderConfig {
    pub name: String,

    #[serde(rename = "type", default = "default_vehicle")]
    pub vehicle: VehicleType,

    /// Current members of the pool.
    #[serde(default)]
    pub proxies: Vec<EndpointConfig>,

    #[serde(default)]
    pub health_check: Option<ProviderHealthCheck>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderHealthCheck {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub interval: u64,

    #[serde(default = "default_true")]
    pub lazy: bool,
}

fn default_endpoint_type() -> String {
    "Direct".to_string()
}

fn default_vehicle() -> VehicleType {
    VehicleType::Inline
}

fn default_true() -> bool {
    true
}

impl EndpointConfig {
    fn build(&self) -> ProxyRef {
        StaticProxy::shared(self.name.clone(), self.kind.clone(), self.udp)
    }
}

impl ProviderHealthCheck {
    fn policy(&self) -> HealthCheckPolicy {
        if !self.enable {
            return HealthCheckPolicy::disabled();
        }
        HealthCheckPolicy {
            url: self.url.clone(),
            interval_secs: self.interval,
            lazy: self.lazy,
        }
    }
}

/// `OUTBOUND_`-prefixed variables, `__` for nesting. Keys are kebab-case like
/// the file, so `OUTBOUND_TRACING__LOG_LEVEL` sets `tracing.log-level`.
fn env_overrides() -> Env {
    Env::prefixed("OUTBOUND_")
        .split("__")
        .map(|key| key.as_str().replace('_', "-").into())
}

impl ResolverConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (OUTBOUND_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(config_path))
                .merge(env_overrides()),
        )
    }

    fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: ResolverConfig = figment.extract()?;
        Ok(config)
    }

    /// Endpoint registry built from `[[proxies]]`. A later entry replaces an
    /// earlier one with the same name.
    pub fn endpoint_registry(&self) -> ProxyRegistry {
        self.proxies.iter().map(EndpointConfig::build).collect()
    }

    /// Provider registry built from `[[proxy-providers]]`.
    pub fn provider_registry(&self) -> anyhow::Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for provider in &self.proxy_providers {
            let policy = provider
                .health_check
                .as_ref()
                .map(ProviderHealthCheck::policy)
                .unwrap_or_else(HealthCheckPolicy::disabled);
            let pool = ProxySetProvider::new(
                provider.name.clone(),
                provider.vehicle,
                policy,
                provider.proxies.iter().map(EndpointConfig::build).collect(),
            );
            registry.register(pool.into())?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbound_group::{Proxy, ProxyProvider};

    const SAMPLE: &str = r#"
[loader]
on-error = "skip"

[tracing]
log-level = "debug"

[[proxies]]
name = "hk-01"
type = "Shadowsocks"

[[proxies]]
name = "jp-01"
type = "Trojan"
udp = false

[[proxy-providers]]
name = "airport"
type = "http"
proxies = [{ name = "HK 01", type = "Vmess" }, { name = "US 01" }]

[proxy-providers.health-check]
enable = true
url = "http://www.gstatic.com/generate_204"
interval = 600

[[proxy-groups]]
name = "auto"
type = "url-test"
proxies = ["hk-01", "jp-01"]
url = "http://www.gstatic.com/generate_204"
interval = "300"
tolerance = 50
"#;

    fn sample() -> ResolverConfig {
        ResolverConfig::from_figment(Figment::from(Toml::string(SAMPLE))).unwrap()
    }

    #[test]
    fn test_sections_parse() {
        let config = sample();
        assert_eq!(config.loader.on_error, OnError::Skip);
        assert_eq!(config.tracing.log_level, "debug");
        assert_eq!(config.proxies.len(), 2);
        assert!(config.proxies[0].udp);
        assert!(!config.proxies[1].udp);
        assert_eq!(config.proxy_providers[0].vehicle, VehicleType::Http);
        assert_eq!(config.proxy_groups.len(), 1);
        assert_eq!(config.proxy_groups[0]["interval"], "300");
        assert_eq!(config.proxy_groups[0]["tolerance"], 50);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ResolverConfig::from_figment(Figment::new()).unwrap();
        assert_eq!(config.loader.on_error, OnError::Abort);
        assert_eq!(config.tracing.service_name, "outbound-group");
        assert!(config.proxy_groups.is_empty());
    }

    #[test]
    fn test_registries() {
        let config = sample();
        let endpoints = config.endpoint_registry();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints.get("jp-01").unwrap().kind(), "Trojan");

        let providers = config.provider_registry().unwrap();
        let airport = providers.get("airport").unwrap();
        assert!(airport.as_proxy_set().is_some());
        assert_eq!(airport.proxies().len(), 2);
        assert_eq!(airport.proxies()[1].kind(), "Direct");
        let policy = airport.health_check().policy();
        assert_eq!(policy.interval_secs, 600);
        assert!(policy.lazy);
        assert_eq!(airport.as_provider().vehicle_type(), VehicleType::Http);
    }

    #[test]
    fn test_env_overrides_multi_word_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "outbound-group.toml",
                "[tracing]\nlog-level = \"warn\"\nservice-name = \"edge\"\n",
            )?;
            jail.set_env("OUTBOUND_TRACING__LOG_LEVEL", "debug");
            jail.set_env("OUTBOUND_LOADER__ON_ERROR", "skip");
            jail.set_env("OUTBOUND_TRACING__OTLP_ENDPOINT", "http://localhost:4317");

            let config = ResolverConfig::load("outbound-group.toml").unwrap();
            assert_eq!(config.tracing.log_level, "debug");
            assert_eq!(config.tracing.service_name, "edge");
            assert_eq!(
                config.tracing.otlp_endpoint.as_deref(),
                Some("http://localhost:4317")
            );
            assert_eq!(config.loader.on_error, OnError::Skip);
            Ok(())
        });
    }

    #[test]
    fn test_duplicate_provider_names_fail() {
        let config = ResolverConfig::from_figment(Figment::from(Toml::string(
            r#"
[[proxy-providers]]
name = "airport"

[[proxy-providers]]
name = "airport"
"#,
        )))
        .unwrap();
        assert!(config.provider_registry().is_err());
    }
}
