//! Array merge strategies
//!
//! Deep merges of configuration trees always let the later side win on
//! scalars and recurse into objects. Arrays are where sources disagree on
//! intent, so the policy for them is named and chosen by the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// How two arrays at the same path are combined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MergeStrategy {
    /// Element-wise deep merge keyed by index; `b` wins on conflicts.
    #[default]
    Replace,
    /// `a` followed by `b`.
    Concat,
    /// Keep `a`.
    First,
    /// Keep `b`.
    Last,
    /// Treat both sides as records keyed by the named field.
    MergeBy(String),
    /// Accumulate each side as its own group.
    ArrayOfArrays,
}

impl MergeStrategy {
    /// `merge:id`, the default keyed strategy.
    pub fn merge_by_id() -> Self {
        Self::MergeBy("id".to_string())
    }
}

impl FromStr for MergeStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "concat" => Ok(Self::Concat),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "aoa" => Ok(Self::ArrayOfArrays),
            "merge" => Ok(Self::merge_by_id()),
            other => match other.strip_prefix("merge:") {
                Some(key) if !key.is_empty() => Ok(Self::MergeBy(key.to_string())),
                _ => Err(Error::UnknownStrategy(other.to_string())),
            },
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Concat => write!(f, "concat"),
            Self::First => write!(f, "first"),
            Self::Last => write!(f, "last"),
            Self::MergeBy(key) => write!(f, "merge:{key}"),
            Self::ArrayOfArrays => write!(f, "aoa"),
        }
    }
}

impl TryFrom<String> for MergeStrategy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MergeStrategy> for String {
    fn from(strategy: MergeStrategy) -> Self {
        strategy.to_string()
    }
}

/// Combine two arrays with the given strategy.
pub fn merge_arrays(a: &[Value], b: &[Value], strategy: &MergeStrategy) -> Vec<Value> {
    match strategy {
        MergeStrategy::Replace => {
            let mut out = a.to_vec();
            for (i, item) in b.iter().enumerate() {
                match out.get_mut(i) {
                    Some(existing) => merge_into(existing, item, strategy),
                    None => out.push(item.clone()),
                }
            }
            out
        }
        MergeStrategy::Concat => a.iter().chain(b).cloned().collect(),
        MergeStrategy::First => a.to_vec(),
        MergeStrategy::Last => b.to_vec(),
        MergeStrategy::MergeBy(key) => merge_records(a, b, key, strategy),
        MergeStrategy::ArrayOfArrays => {
            let group = Value::Array(b.to_vec());
            match a.first() {
                None => vec![group],
                Some(Value::Array(_)) => {
                    let mut out = a.to_vec();
                    out.push(group);
                    out
                }
                Some(_) => vec![Value::Array(a.to_vec()), group],
            }
        }
    }
}

/// Deep merge `b` over `a`, returning the result.
pub fn merge_values(a: &Value, b: &Value, strategy: &MergeStrategy) -> Value {
    let mut out = a.clone();
    merge_into(&mut out, b, strategy);
    out
}

/// Deep merge `other` into `base` in place.
///
/// Objects merge key by key, arrays follow `strategy`, anything else is
/// replaced by `other`.
pub fn merge_into(base: &mut Value, other: &Value, strategy: &MergeStrategy) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    merge_into(base_val, other_val, strategy);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (Value::Array(base_items), Value::Array(other_items)) => {
            let merged = merge_arrays(base_items, other_items, strategy);
            *base_items = merged;
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}

#[derive(Debug, PartialEq)]
enum RecordKey {
    Field(String),
    Sole(String),
}

fn record_key(record: &Value, key: &str) -> Option<RecordKey> {
    let map = record.as_object()?;
    if let Some(value) = map.get(key) {
        return Some(RecordKey::Field(value.to_string()));
    }
    // A single-key record is keyed by that key
    match map.len() {
        1 => map.keys().next().map(|k| RecordKey::Sole(k.clone())),
        _ => None,
    }
}

fn merge_records(a: &[Value], b: &[Value], key: &str, strategy: &MergeStrategy) -> Vec<Value> {
    let mut out: Vec<(Option<RecordKey>, Value)> = Vec::with_capacity(a.len() + b.len());

    for record in a.iter().chain(b) {
        let id = record_key(record, key);
        let position = id
            .as_ref()
            .and_then(|id| out.iter().position(|(k, _)| k.as_ref() == Some(id)));
        match position {
            Some(i) => merge_into(&mut out[i].1, record, strategy),
            None => out.push((id, record.clone())),
        }
    }

    out.into_iter().map(|(_, value)| value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("replace", MergeStrategy::Replace)]
    #[case("concat", MergeStrategy::Concat)]
    #[case("first", MergeStrategy::First)]
    #[case("last", MergeStrategy::Last)]
    #[case("merge", MergeStrategy::MergeBy("id".into()))]
    #[case("merge:name", MergeStrategy::MergeBy("name".into()))]
    #[case("aoa", MergeStrategy::ArrayOfArrays)]
    fn strategy_names_parse(#[case] name: &str, #[case] expected: MergeStrategy) {
        assert_eq!(name.parse::<MergeStrategy>().unwrap(), expected);
    }

    #[rstest]
    #[case("union")]
    #[case("merge:")]
    #[case("")]
    fn unknown_strategy_names_fail(#[case] name: &str) {
        assert!(name.parse::<MergeStrategy>().is_err());
    }

    #[test]
    fn strategy_serializes_as_its_name() {
        let value = serde_json::to_value(MergeStrategy::MergeBy("name".into())).unwrap();
        assert_eq!(value, json!("merge:name"));
        let parsed: MergeStrategy = serde_json::from_value(json!("aoa")).unwrap();
        assert_eq!(parsed, MergeStrategy::ArrayOfArrays);
    }

    #[test]
    fn single_key_records_fall_back_to_their_key() {
        let a = [json!({"php": {"version": "8.1"}})];
        let b = [json!({"php": {"xdebug": true}})];
        let merged = merge_arrays(&a, &b, &MergeStrategy::merge_by_id());
        assert_eq!(merged, vec![json!({"php": {"version": "8.1", "xdebug": true}})]);
    }
}
