//! Key codec
//!
//! Keys are camelCase inside the program and kebab-case in files and the
//! environment. `encode` goes from camel to kebab, `decode` comes back.
//! Scoped package names (`@scope/name`) are used verbatim as map keys by
//! plugins and are never transformed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static SCOPED_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[^/]+/").expect("Invalid scoped package regex"));

/// Whether a key is exempt from transformation.
pub fn is_scoped(key: &str) -> bool {
    SCOPED_PACKAGE.is_match(key)
}

/// Encode one key: `appRoot` -> `app-root`.
pub fn encode_key(key: &str) -> String {
    if is_scoped(key) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decode one key: `app-root` -> `appRoot`.
pub fn decode_key(key: &str) -> String {
    if is_scoped(key) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('-', Some(next)) if next.is_lowercase() => {
                let next = *next;
                chars.next();
                out.extend(next.to_uppercase());
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Encode every segment of a dotted path.
pub fn encode_path(path: &str) -> String {
    map_segments(path, encode_key)
}

/// Decode every segment of a dotted path.
pub fn decode_path(path: &str) -> String {
    map_segments(path, decode_key)
}

pub fn encode_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    paths.iter().map(|p| encode_path(p.as_ref())).collect()
}

pub fn decode_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    paths.iter().map(|p| decode_path(p.as_ref())).collect()
}

/// Encode every object key at every depth. Non-objects pass through.
pub fn encode_tree(value: &Value) -> Value {
    map_keys(value, &encode_key)
}

/// Decode every object key at every depth. Non-objects pass through.
pub fn decode_tree(value: &Value) -> Value {
    map_keys(value, &decode_key)
}

fn map_segments(path: &str, f: fn(&str) -> String) -> String {
    // A scoped name may carry dots of its own, so it is checked whole first
    if is_scoped(path) {
        return path.to_string();
    }
    path.split('.').map(f).collect::<Vec<_>>().join(".")
}

fn map_keys(value: &Value, f: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(f(key), map_keys(child, f));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| map_keys(v, f)).collect()),
        other => other.clone(),
    }
}
