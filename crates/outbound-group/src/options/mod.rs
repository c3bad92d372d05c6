//! Group record binding: loosely-typed record in, [`GroupOptions`] out.

pub mod weak;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::group::GroupType;

use self::weak::{WeakBool, WeakInt, WeakList, WeakString};

/// A raw group configuration record, e.g. one entry of `proxy-groups`.
pub type GroupRecord = Map<String, Value>;

/// Options shared by every group kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOptions {
    pub name: String,
    /// The `type` key as written. Parsed into a [`GroupType`] at dispatch so
    /// that an unknown kind is reported with the group name attached.
    pub group_type: String,
    /// Endpoint names listed inline. Duplicates are kept.
    pub proxies: Vec<String>,
    /// Provider names listed under `use`.
    pub uses: Vec<String>,
    pub url: String,
    /// Probe interval in seconds; 0 means unset.
    pub interval: u64,
    pub lazy: bool,
    pub disable_udp: bool,
    pub disable_dns: bool,
    pub filter: String,
    pub interface_name: String,
    pub routing_mark: u32,
}

/// Socket options handed to the dialer of every member of the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialOptions {
    pub interface_name: String,
    pub routing_mark: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawGroupOptions {
    name: Option<WeakString>,
    #[serde(rename = "type")]
    group_type: Option<WeakString>,
    proxies: Option<WeakList>,
    #[serde(rename = "use")]
    uses: Option<WeakList>,
    url: Option<WeakString>,
    interval: Option<WeakInt>,
    lazy: Option<WeakBool>,
    disable_udp: Option<WeakBool>,
    disable_dns: Option<WeakBool>,
    filter: Option<WeakString>,
    interface_name: Option<WeakString>,
    routing_mark: Option<WeakInt>,
}

fn unwrap_string(value: Option<WeakString>) -> String {
    value.map(|v| v.0).unwrap_or_default()
}

fn unwrap_list(value: Option<WeakList>) -> Vec<String> {
    value.map(|v| v.0).unwrap_or_default()
}

fn unwrap_bool(value: Option<WeakBool>, default: bool) -> bool {
    value.map(|v| v.0).unwrap_or(default)
}

impl GroupOptions {
    /// Bind a raw record. Unknown keys are ignored.
    pub fn from_record(record: &GroupRecord) -> Result<Self, ResolveError> {
        let name_hint = record
            .get("name")
            .and_then(weak::string_of)
            .filter(|name| !name.is_empty());

        let raw: RawGroupOptions = serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| ResolveError::Format {
                group: name_hint.clone(),
                reason: e.to_string(),
            })?;

        let format_error = |reason: &str| ResolveError::Format {
            group: name_hint.clone(),
            reason: reason.to_string(),
        };

        let interval = match raw.interval {
            Some(WeakInt(secs)) => {
                u64::try_from(secs).map_err(|_| format_error("`interval` must not be negative"))?
            }
            None => 0,
        };
        let routing_mark = match raw.routing_mark {
            Some(WeakInt(mark)) => {
                u32::try_from(mark).map_err(|_| format_error("`routing-mark` out of range"))?
            }
            None => 0,
        };

        let options = GroupOptions {
            name: unwrap_string(raw.name),
            group_type: unwrap_string(raw.group_type),
            proxies: unwrap_list(raw.proxies),
            uses: unwrap_list(raw.uses),
            url: unwrap_string(raw.url),
            interval,
            lazy: unwrap_bool(raw.lazy, true),
            disable_udp: unwrap_bool(raw.disable_udp, false),
            disable_dns: unwrap_bool(raw.disable_dns, false),
            filter: unwrap_string(raw.filter),
            interface_name: unwrap_string(raw.interface_name),
            routing_mark,
        };

        if options.name.is_empty() {
            return Err(format_error("`name` is empty"));
        }
        if options.group_type.is_empty() {
            return Err(format_error("`type` is empty"));
        }

        Ok(options)
    }

    /// The strategy kind, if `type` names a known one.
    pub fn kind(&self) -> Option<GroupType> {
        GroupType::parse(&self.group_type)
    }

    pub fn dial_options(&self) -> DialOptions {
        DialOptions {
            interface_name: self.interface_name.clone(),
            routing_mark: self.routing_mark,
        }
    }
}

/// `tolerance` of a `url-test` record, in milliseconds. Values that are not
/// integers in range are ignored.
pub fn url_test_tolerance(record: &GroupRecord) -> u16 {
    record
        .get("tolerance")
        .and_then(weak::int_of)
        .and_then(|t| u16::try_from(t).ok())
        .unwrap_or(0)
}

/// `strategy` of a `load-balance` record. Only string values are honoured.
pub fn load_balance_strategy(record: &GroupRecord) -> Option<&str> {
    record.get("strategy").and_then(Value::as_str)
}
