//! Environment variable import
//!
//! `LANDO_CORE_ENGINE=docker-engine` becomes `core.engine`, and a double
//! underscore stands for a hyphen: `LANDO_SYSTEM_CACHE__DIR` becomes
//! `system.cache-dir`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::path::{key_segments, set_at_path};

/// Map one variable name to a dotted config path, if it carries the prefix.
///
/// The prefix match is case-insensitive and the remainder is lowercased.
pub fn env_path(prefix: &str, name: &str) -> Option<String> {
    let head = format!("{}_", prefix.to_lowercase());
    let lowered = name.to_lowercase();
    let rest = lowered.strip_prefix(&head)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.replace("__", "-").replace('_', "."))
}

/// Parse an environment value as JSON where possible, otherwise as a string.
pub fn env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Build a tree from every variable carrying `<prefix>_`.
///
/// Variables are applied in name order so the result does not depend on
/// the platform's environment ordering.
pub fn env_tree<I, K, V>(prefix: &str, vars: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let sorted: BTreeMap<String, String> = vars
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    let mut tree = Value::Object(Map::new());
    for (name, raw) in &sorted {
        let Some(path) = env_path(prefix, name) else {
            continue;
        };
        let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            continue;
        }
        set_at_path(&mut tree, &key_segments(&parts), env_value(raw));
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("LANDO_CORE_ENGINE", Some("core.engine"))]
    #[case("lando_core_engine", Some("core.engine"))]
    #[case("LANDO_SYSTEM_CACHE__DIR", Some("system.cache-dir"))]
    #[case("LANDO_", None)]
    #[case("LANDOX_CORE", None)]
    #[case("PATH", None)]
    fn variable_names_map_to_paths(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(env_path("lando", name).as_deref(), expected);
    }

    #[test]
    fn values_parse_as_json_when_possible() {
        assert_eq!(env_value("true"), json!(true));
        assert_eq!(env_value("3"), json!(3));
        assert_eq!(env_value("[\"a\"]"), json!(["a"]));
        assert_eq!(env_value("docker-engine"), json!("docker-engine"));
    }

    #[test]
    fn tree_ignores_foreign_variables() {
        let tree = env_tree(
            "lando",
            [
                ("LANDO_CORE_CACHING", "false"),
                ("LANDO_CORE_ENGINE", "docker-engine"),
                ("HOME", "/home/me"),
            ],
        );
        assert_eq!(
            tree,
            json!({"core": {"caching": false, "engine": "docker-engine"}})
        );
    }
}
