//! Weakly-typed scalar coercion for hand-written configuration.
//!
//! Group records come from YAML/TOML written by people, so `"300"` must be
//! accepted where an integer is expected and `1` where a bool is. These
//! newtypes deserialize from any `serde_json::Value` shape that has an
//! obvious scalar reading and reject the rest.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

/// A string that also accepts numbers and bools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeakString(pub String);

/// A signed integer that also accepts numeric strings, floats and bools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeakInt(pub i64);

/// A bool that also accepts numbers and the usual spellings of true/false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeakBool(pub bool);

/// A list of strings whose elements are coerced like [`WeakString`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeakList(pub Vec<String>);

pub(crate) fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim() {
            "" => Some(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        Value::Array(_) | Value::Object(_) => None,
    }
}

impl<'de> Deserialize<'de> for WeakString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        string_of(&value)
            .map(WeakString)
            .ok_or_else(|| de::Error::custom(format!("expected a string, found {value}")))
    }
}

impl<'de> Deserialize<'de> for WeakInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        int_of(&value)
            .map(WeakInt)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, found {value}")))
    }
}

impl<'de> Deserialize<'de> for WeakBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        bool_of(&value)
            .map(WeakBool)
            .ok_or_else(|| de::Error::custom(format!("expected a bool, found {value}")))
    }
}

impl<'de> Deserialize<'de> for WeakList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    string_of(item).ok_or_else(|| {
                        de::Error::custom(format!("expected a list of strings, found {item}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(WeakList),
            Value::Null => Ok(WeakList::default()),
            other => Err(de::Error::custom(format!("expected a list, found {other}"))),
        }
    }
}
