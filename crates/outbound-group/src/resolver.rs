//! Group resolution: one record in, one [`ProxyGroup`] out.
//!
//! Everything is validated and built before the provider registry or any
//! pool is touched, so a failing group leaves no trace behind.

use std::sync::Arc;

use regex::Regex;

use crate::error::{GroupError, ResolveError};
use crate::group::{Fallback, GroupType, LoadBalance, ProxyGroup, Relay, Selector, UrlTest};
use crate::health::HealthCheckPolicy;
use crate::options::{load_balance_strategy, url_test_tolerance, GroupOptions, GroupRecord};
use crate::provider::{CompatibleProvider, FilterProvider, ProviderHandle, ProviderRegistry};
use crate::proxy::ProxyRegistry;

/// Resolve one group record.
///
/// Groups listed in `proxies` must already be in `proxies`; pools listed in
/// `use` must already be in `providers`. When the record lists endpoints
/// inline, a provider named after the group is added to `providers`.
pub fn resolve_group(
    record: &GroupRecord,
    proxies: &ProxyRegistry,
    providers: &mut ProviderRegistry,
) -> Result<ProxyGroup, ResolveError> {
    let options = GroupOptions::from_record(record)?;

    let span = outbound_tracing::resolve_group_span!(&options.name, &options.group_type);
    let _entered = span.enter();

    let assembly = assemble(record, &options, proxies, providers)
        .map_err(|e| e.in_group(&options.name))?;
    span.record("providers", assembly.group.providers().len());

    assembly
        .commit(providers)
        .map_err(|e| e.in_group(&options.name))
}

/// A fully built group plus the registrations it still has to make.
struct Assembly {
    synthetic: Option<Arc<CompatibleProvider>>,
    derived: Vec<Arc<FilterProvider>>,
    group: ProxyGroup,
}

impl Assembly {
    fn commit(self, providers: &mut ProviderRegistry) -> Result<ProxyGroup, GroupError> {
        if let Some(synthetic) = self.synthetic {
            providers.register(synthetic.into())?;
        }
        for derived in &self.derived {
            derived.parent().register_dependent(derived);
        }
        Ok(self.group)
    }
}

fn assemble(
    record: &GroupRecord,
    options: &GroupOptions,
    proxies: &ProxyRegistry,
    providers: &ProviderRegistry,
) -> Result<Assembly, GroupError> {
    let filter = compile_filter(&options.filter)?;

    if options.proxies.is_empty() && options.uses.is_empty() {
        return Err(GroupError::MissingProxies);
    }

    let synthetic = if options.proxies.is_empty() {
        None
    } else {
        let members = proxies.resolve(&options.proxies)?;
        if providers.contains(&options.name) {
            return Err(GroupError::DuplicateProvider(options.name.clone()));
        }
        let policy = HealthCheckPolicy::for_group(options)?;
        tracing::debug!(
            members = members.len(),
            health_check = policy.is_enabled(),
            "Wrapped inline proxies"
        );
        Some(Arc::new(CompatibleProvider::new(
            options.name.clone(),
            members,
            policy,
        )?))
    };

    let derived = if options.uses.is_empty() {
        Vec::new()
    } else {
        derive_providers(options, filter.as_ref(), providers)?
    };

    let ordered = order_providers(options.kind(), synthetic.clone(), &derived);
    let group = dispatch(record, options, ordered)?;

    Ok(Assembly {
        synthetic,
        derived,
        group,
    })
}

/// Compile the group's name filter. An empty pattern matches everything.
fn compile_filter(pattern: &str) -> Result<Option<Regex>, GroupError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern).map(Some).map_err(GroupError::InvalidFilter)
}

/// One filtered view per `use` entry, checked one entry at a time. Only
/// dynamic pools can be listed.
fn derive_providers(
    options: &GroupOptions,
    filter: Option<&Regex>,
    providers: &ProviderRegistry,
) -> Result<Vec<Arc<FilterProvider>>, GroupError> {
    let mut derived = Vec::with_capacity(options.uses.len());
    for source in &options.uses {
        let handle = providers
            .get(source)
            .ok_or_else(|| GroupError::NotFound(source.clone()))?;
        let pool = handle
            .as_proxy_set()
            .cloned()
            .ok_or_else(|| GroupError::IncompatibleReference(source.clone()))?;
        let policy = HealthCheckPolicy::for_group(options)?;
        let name = FilterProvider::derived_name(source, &options.name);
        tracing::debug!(provider = %name, source = %source, "Derived filtered provider");
        derived.push(FilterProvider::new(name, pool, filter.cloned(), policy));
    }
    Ok(derived)
}

/// `fallback` tries pools from `use` before inline proxies; every other kind
/// puts the inline proxies first.
fn order_providers(
    kind: Option<GroupType>,
    synthetic: Option<Arc<CompatibleProvider>>,
    derived: &[Arc<FilterProvider>],
) -> Vec<ProviderHandle> {
    let synthetic = synthetic.map(ProviderHandle::from);
    let derived = derived.iter().cloned().map(ProviderHandle::from);

    if kind == Some(GroupType::Fallback) {
        derived.chain(synthetic).collect()
    } else {
        synthetic.into_iter().chain(derived).collect()
    }
}

fn dispatch(
    record: &GroupRecord,
    options: &GroupOptions,
    providers: Vec<ProviderHandle>,
) -> Result<ProxyGroup, GroupError> {
    let kind = options
        .kind()
        .ok_or_else(|| GroupError::UnsupportedType(options.group_type.clone()))?;

    let group = match kind {
        GroupType::Select => ProxyGroup::Selector(Selector::new(options, providers)),
        GroupType::UrlTest => ProxyGroup::UrlTest(UrlTest::new(
            options,
            providers,
            HealthCheckPolicy::for_group(options)?,
            url_test_tolerance(record),
        )),
        GroupType::Fallback => ProxyGroup::Fallback(Fallback::new(
            options,
            providers,
            HealthCheckPolicy::for_group(options)?,
        )),
        GroupType::LoadBalance => ProxyGroup::LoadBalance(LoadBalance::new(
            options,
            providers,
            HealthCheckPolicy::for_group(options)?,
            load_balance_strategy(record),
        )?),
        GroupType::Relay => ProxyGroup::Relay(Relay::new(options, providers)),
    };

    tracing::info!(
        group = %options.name,
        kind = %kind.as_str(),
        providers = group.providers().len(),
        "Resolved proxy group"
    );
    Ok(group)
}
