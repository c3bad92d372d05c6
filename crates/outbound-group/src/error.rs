//! Error types for group resolution.

use serde::Serialize;

/// A failure while resolving one group, before the group name is attached.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("`use` or `proxies` missing")]
    MissingProxies,

    #[error("provider '{0}' is not a proxy set and can't be listed in `use`")]
    IncompatibleReference(String),

    #[error("invalid filter regex: {0}")]
    InvalidFilter(#[source] regex::Error),

    #[error("`url` or `interval` missing")]
    MissingHealthCheck,

    #[error("duplicate provider name '{0}'")]
    DuplicateProvider(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("unsupported load-balance strategy: {0}")]
    UnsupportedStrategy(String),
}

/// A failure returned by [`crate::resolve_group`].
///
/// Every variant carries the group name when one could be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{}format error: {reason}", prefix(.group))]
    Format { group: Option<String>, reason: String },

    #[error("{group}: {source}")]
    Group {
        group: String,
        #[source]
        source: GroupError,
    },
}

fn prefix(group: &Option<String>) -> String {
    match group {
        Some(name) => format!("{name}: "),
        None => String::new(),
    }
}

/// Coarse classification of resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Format,
    UnsupportedType,
    MissingReference,
    IncompatibleReference,
    InvalidFilter,
    MissingHealthCheck,
    DuplicateProvider,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Format => "format",
            ErrorKind::UnsupportedType => "unsupported-type",
            ErrorKind::MissingReference => "missing-reference",
            ErrorKind::IncompatibleReference => "incompatible-reference",
            ErrorKind::InvalidFilter => "invalid-filter",
            ErrorKind::MissingHealthCheck => "missing-health-check",
            ErrorKind::DuplicateProvider => "duplicate-provider",
        }
    }
}

impl GroupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroupError::NotFound(_) | GroupError::MissingProxies => ErrorKind::MissingReference,
            GroupError::IncompatibleReference(_) => ErrorKind::IncompatibleReference,
            GroupError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            GroupError::MissingHealthCheck => ErrorKind::MissingHealthCheck,
            GroupError::DuplicateProvider(_) => ErrorKind::DuplicateProvider,
            GroupError::UnsupportedType(_) | GroupError::UnsupportedStrategy(_) => {
                ErrorKind::UnsupportedType
            }
        }
    }

    /// Attach the group name.
    pub fn in_group(self, group: &str) -> ResolveError {
        ResolveError::Group {
            group: group.to_string(),
            source: self,
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Format { .. } => ErrorKind::Format,
            ResolveError::Group { source, .. } => source.kind(),
        }
    }

    /// Name of the group that failed, if it was decoded.
    pub fn group(&self) -> Option<&str> {
        match self {
            ResolveError::Format { group, .. } => group.as_deref(),
            ResolveError::Group { group, .. } => Some(group),
        }
    }

    /// The underlying group error, if any.
    pub fn group_error(&self) -> Option<&GroupError> {
        match self {
            ResolveError::Format { .. } => None,
            ResolveError::Group { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_error_display_is_prefixed() {
        let err = GroupError::NotFound("hk-01".to_string()).in_group("auto");
        assert_eq!(err.to_string(), "auto: 'hk-01' not found");
        assert_eq!(err.kind(), ErrorKind::MissingReference);
        assert_eq!(err.group(), Some("auto"));
    }

    #[test]
    fn test_format_error_without_name() {
        let err = ResolveError::Format {
            group: None,
            reason: "`name` is empty".to_string(),
        };
        assert_eq!(err.to_string(), "format error: `name` is empty");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.group().is_none());
    }

    #[test]
    fn test_format_error_with_name() {
        let err = ResolveError::Format {
            group: Some("auto".to_string()),
            reason: "`type` is empty".to_string(),
        };
        assert_eq!(err.to_string(), "auto: format error: `type` is empty");
    }

    #[test]
    fn test_unsupported_type_names_kind() {
        let err = GroupError::UnsupportedType("round-robin".to_string()).in_group("lb");
        assert_eq!(err.to_string(), "lb: unsupported type: round-robin");
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_missing_proxies_is_missing_reference() {
        assert_eq!(
            GroupError::MissingProxies.kind(),
            ErrorKind::MissingReference
        );
        assert_eq!(ErrorKind::MissingReference.as_str(), "missing-reference");
    }
}
