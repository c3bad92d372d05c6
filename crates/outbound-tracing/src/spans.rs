//! Span builder helpers for resolver instrumentation.

/// Create a tracing span for one configuration load pass.
///
/// Usage: `let _span = load_pass_span!(pass_id, records.len()).entered();`
///
/// Fields recorded later by the pass:
/// - `resolved`: number of groups that resolved
/// - `skipped`: number of groups dropped under the skip policy
#[macro_export]
macro_rules! load_pass_span {
    ($pass_id:expr, $group_count:expr) => {
        tracing::info_span!(
            "load_pass",
            pass_id = %$pass_id,
            group_count = $group_count,
            resolved = tracing::field::Empty,
            skipped = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for the resolution of a single group.
#[macro_export]
macro_rules! resolve_group_span {
    ($group:expr, $kind:expr) => {
        tracing::debug_span!(
            "resolve_group",
            group = %$group,
            kind = %$kind,
            providers = tracing::field::Empty,
        )
    };
}
