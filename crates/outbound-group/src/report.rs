//! Load pass summary.
//!
//! Collected by [`crate::loader::LoadPass`] and emitted as OTLP span
//! attributes plus tracing events, so a bad `proxy-groups` section shows up
//! in the trace of the load that hit it.

use opentelemetry::{Key, Value};
use serde::Serialize;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::{ErrorKind, ResolveError};
use crate::group::{GroupType, ProxyGroup};
use crate::health::HealthCheckPolicy;

/// What a resolved group ended up routing through.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub providers: Vec<String>,
    pub candidates: usize,
    pub health_check: Option<HealthCheckPolicy>,
}

impl GroupSummary {
    pub fn of(group: &ProxyGroup) -> Self {
        Self {
            name: group.name().to_string(),
            group_type: group.group_type(),
            providers: group
                .providers()
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
            candidates: group.candidates().len(),
            health_check: group.health_policy().cloned(),
        }
    }
}

/// A group dropped under the skip policy.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedGroup {
    /// Position of the record in `proxy-groups`.
    pub index: usize,
    pub name: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl SkippedGroup {
    pub fn new(index: usize, error: &ResolveError) -> Self {
        Self {
            index,
            name: error.group().map(str::to_string),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one load pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub pass_id: String,
    /// Resolved groups, in resolution order.
    pub resolved: Vec<GroupSummary>,
    pub skipped: Vec<SkippedGroup>,
    /// Provider registry contents after the pass, sorted.
    pub providers: Vec<String>,
}

impl LoadReport {
    pub fn new(pass_id: impl Into<String>) -> Self {
        Self {
            pass_id: pass_id.into(),
            ..Self::default()
        }
    }

    /// Emit OTLP span attributes and tracing events for this report.
    pub fn emit(&self, span: &Span) {
        span.set_attribute(
            "outbound.load.resolved_count",
            Value::I64(self.resolved.len() as i64),
        );
        span.set_attribute(
            "outbound.load.skipped_count",
            Value::I64(self.skipped.len() as i64),
        );

        if !self.resolved.is_empty() {
            let names: Vec<&str> = self.resolved.iter().map(|g| g.name.as_str()).collect();
            span.set_attribute(
                Key::from_static_str("outbound.load.groups"),
                Value::String(names.join(",").into()),
            );
        }

        if !self.skipped.is_empty() {
            if let Ok(json_str) = serde_json::to_string(&self.skipped) {
                span.set_attribute(
                    Key::from_static_str("outbound.load.skipped_json"),
                    Value::String(json_str.into()),
                );
            }
        }

        for group in &self.resolved {
            tracing::debug!(
                group = %group.name,
                kind = group.group_type.as_str(),
                providers = %group.providers.join(","),
                candidates = group.candidates,
                "Group ready"
            );
        }

        for skipped in &self.skipped {
            tracing::warn!(
                index = skipped.index,
                group = skipped.name.as_deref().unwrap_or(""),
                kind = skipped.kind.as_str(),
                message = %skipped.message,
                "Proxy group skipped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GroupError;
    use crate::group::test_support::{options, provider};
    use crate::group::Selector;

    fn report() -> LoadReport {
        let group = ProxyGroup::Selector(Selector::new(
            &options("pick", "select"),
            vec![provider("pick", &["a", "b"])],
        ));
        let mut report = LoadReport::new("pass-1");
        report.resolved.push(GroupSummary::of(&group));
        report.skipped.push(SkippedGroup::new(
            3,
            &GroupError::MissingHealthCheck.in_group("auto"),
        ));
        report
    }

    #[test]
    fn test_summary_fields() {
        let report = report();
        let summary = &report.resolved[0];
        assert_eq!(summary.name, "pick");
        assert_eq!(summary.group_type, GroupType::Select);
        assert_eq!(summary.providers, vec!["pick"]);
        assert_eq!(summary.candidates, 2);
        assert!(summary.health_check.is_none());

        let skipped = &report.skipped[0];
        assert_eq!(skipped.index, 3);
        assert_eq!(skipped.name.as_deref(), Some("auto"));
        assert_eq!(skipped.kind, ErrorKind::MissingHealthCheck);
    }

    #[test]
    fn test_serializes_with_config_names() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["resolved"][0]["type"], "select");
        assert_eq!(json["skipped"][0]["kind"], "missing-health-check");
        assert_eq!(json["skipped"][0]["message"], "auto: `url` or `interval` missing");
    }

    #[test]
    fn test_emit_no_panic() {
        let span = tracing::info_span!("test_load_report");
        report().emit(&span);
        LoadReport::new("empty").emit(&span);
    }
}
