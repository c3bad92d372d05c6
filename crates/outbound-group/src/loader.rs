//! Whole-configuration load pass.
//!
//! Groups may list other groups under `proxies`, so records are resolved in
//! dependency order and every resolved group is added to the endpoint
//! registry before the groups that reference it are resolved.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

use crate::error::ResolveError;
use crate::group::ProxyGroup;
use crate::options::weak::string_of;
use crate::options::GroupRecord;
use crate::provider::ProviderRegistry;
use crate::proxy::ProxyRegistry;
use crate::report::{GroupSummary, LoadReport, SkippedGroup};
use crate::resolver::resolve_group;

/// What a pass does when a group fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    /// Stop at the first failing group.
    #[default]
    Abort,
    /// Record the failure in the report and continue.
    Skip,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("duplicate group name '{0}'")]
    DuplicateGroup(String),

    #[error("proxy groups reference each other: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Indices of `records` in resolution order.
///
/// A group comes after every group it lists in `proxies`; otherwise file
/// order is kept. Records whose name or `proxies` can't be read are ordered
/// as if they had no dependencies and fail later, when resolved.
pub fn order_groups(records: &[GroupRecord]) -> Result<Vec<usize>, LoadError> {
    let names: Vec<Option<String>> = records.iter().map(record_name).collect();

    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for (index, name) in names.iter().enumerate() {
        if let Some(name) = name.as_deref() {
            if index_of.insert(name, index).is_some() {
                return Err(LoadError::DuplicateGroup(name.to_string()));
            }
        }
    }

    // dependents[i]: records that list record i under `proxies`
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut pending: Vec<usize> = vec![0; records.len()];
    for (index, record) in records.iter().enumerate() {
        let mut seen = HashSet::new();
        for member in record_members(record) {
            if let Some(&dep) = index_of.get(member.as_str()) {
                if seen.insert(dep) {
                    dependents[dep].push(index);
                    pending[index] += 1;
                }
            }
        }
    }

    let mut order = Vec::with_capacity(records.len());
    let mut done = vec![false; records.len()];
    while order.len() < records.len() {
        let Some(next) = (0..records.len()).find(|&i| !done[i] && pending[i] == 0) else {
            let stuck = (0..records.len())
                .filter(|&i| !done[i])
                .map(|i| names[i].clone().unwrap_or_default())
                .collect();
            return Err(LoadError::Cycle(stuck));
        };
        done[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
        }
    }
    Ok(order)
}

fn record_name(record: &GroupRecord) -> Option<String> {
    record
        .get("name")
        .and_then(string_of)
        .filter(|name| !name.is_empty())
}

fn record_members(record: &GroupRecord) -> Vec<String> {
    match record.get("proxies").and_then(|v| v.as_array()) {
        Some(items) => items.iter().filter_map(string_of).collect(),
        None => Vec::new(),
    }
}

/// Groups built by a pass, in resolution order, plus its report.
#[derive(Debug)]
pub struct LoadOutcome {
    pub groups: Vec<Arc<ProxyGroup>>,
    pub report: LoadReport,
}

/// One pass over a `proxy-groups` section.
///
/// Resolved groups are inserted into the endpoint registry and synthetic
/// providers into the provider registry; both stay there when a later group
/// aborts the pass.
pub struct LoadPass<'a> {
    proxies: &'a mut ProxyRegistry,
    providers: &'a mut ProviderRegistry,
    on_error: OnError,
}

impl<'a> LoadPass<'a> {
    pub fn new(proxies: &'a mut ProxyRegistry, providers: &'a mut ProviderRegistry) -> Self {
        Self {
            proxies,
            providers,
            on_error: OnError::default(),
        }
    }

    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn run(self, records: &[GroupRecord]) -> Result<LoadOutcome, LoadError> {
        let pass_id = Uuid::new_v4().to_string();
        let span = outbound_tracing::load_pass_span!(pass_id, records.len());
        let _entered = span.enter();

        if let Some(name) = records
            .iter()
            .filter_map(record_name)
            .find(|name| self.proxies.contains(name))
        {
            return Err(LoadError::DuplicateGroup(name));
        }
        let order = order_groups(records)?;

        let mut report = LoadReport::new(pass_id);
        let mut groups = Vec::with_capacity(records.len());
        for index in order {
            match resolve_group(&records[index], &*self.proxies, &mut *self.providers) {
                Ok(group) => {
                    let group = Arc::new(group);
                    report.resolved.push(GroupSummary::of(&group));
                    self.proxies.insert(group.clone());
                    groups.push(group);
                }
                Err(err) if self.on_error == OnError::Skip => {
                    report.skipped.push(SkippedGroup::new(index, &err));
                }
                Err(err) => {
                    close(&span, &mut report, &*self.providers);
                    tracing::error!(index, error = %err, "Load pass aborted");
                    return Err(err.into());
                }
            }
        }

        close(&span, &mut report, &*self.providers);
        tracing::info!(
            resolved = report.resolved.len(),
            skipped = report.skipped.len(),
            providers = report.providers.len(),
            "Load pass complete"
        );

        Ok(LoadOutcome { groups, report })
    }
}

/// Record what the pass got through on its span, aborted or not.
fn close(span: &Span, report: &mut LoadReport, providers: &ProviderRegistry) {
    report.providers = providers.names();
    span.record("resolved", report.resolved.len());
    span.record("skipped", report.skipped.len());
    report.emit(span);
}
