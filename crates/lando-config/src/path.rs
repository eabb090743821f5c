//! Dotted path parsing and traversal
//!
//! # Path Syntax
//!
//! - Dot-separated keys: `core.engine`
//! - Array indexing: `plugins[0].name` or `plugins.0.name`
//! - Store selector (handled by [`crate::Config::get`]): `user:core.engine`

use serde_json::{Map, Value};

/// A segment of a path, either a key or an array index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// The segment as a plain string, indices included.
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(idx) => idx.to_string(),
        }
    }
}

/// Parse a path string into segments.
///
/// An empty path parses to no segments, which addresses the whole tree.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current_key = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !current_key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                }
            }
            '[' => {
                if !current_key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current_key)));
                }
                let mut index_str = String::new();
                for ch in chars.by_ref() {
                    if ch == ']' {
                        break;
                    }
                    index_str.push(ch);
                }
                if let Ok(index) = index_str.parse::<usize>() {
                    segments.push(PathSegment::Index(index));
                }
            }
            _ => current_key.push(ch),
        }
    }

    if !current_key.is_empty() {
        segments.push(PathSegment::Key(current_key));
    }

    segments
}

/// Build key segments from already-split parts.
pub fn key_segments<S: AsRef<str>>(parts: &[S]) -> Vec<PathSegment> {
    parts
        .iter()
        .map(|p| PathSegment::Key(p.as_ref().to_string()))
        .collect()
}

fn child<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
        (Value::Array(items), PathSegment::Key(key)) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        (Value::Array(items), PathSegment::Index(idx)) => items.get_mut(*idx),
        (Value::Array(items), PathSegment::Key(key)) => items.get_mut(key.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Get a reference to the value at the given path.
pub fn get_at_path<'a>(value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments.iter().try_fold(value, child)
}

/// Set a value at the given path, creating intermediate objects.
///
/// Scalars standing where an object is needed are replaced. Returns
/// `false` only when an array index is out of range.
pub fn set_at_path(value: &mut Value, segments: &[PathSegment], new_value: Value) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        *value = new_value;
        return true;
    };

    if let (Value::Array(items), PathSegment::Index(idx)) = (&mut *value, first) {
        return match items.get_mut(*idx) {
            Some(next) => set_at_path(next, rest, new_value),
            None => false,
        };
    }

    if matches!(value, Value::Array(_)) {
        if let Some(next) = child_mut(value, first) {
            return set_at_path(next, rest, new_value);
        }
        return false;
    }

    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    let Value::Object(map) = value else {
        return false;
    };
    let next = map
        .entry(first.as_key())
        .or_insert_with(|| Value::Object(Map::new()));
    set_at_path(next, rest, new_value)
}

/// Remove the value at the given path, returning it if it existed.
pub fn remove_at_path(value: &mut Value, segments: &[PathSegment]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let parent = parents.iter().try_fold(value, |v, s| child_mut(v, s))?;

    match (parent, last) {
        (Value::Object(map), segment) => map.shift_remove(&segment.as_key()),
        (Value::Array(items), segment) => {
            let idx = match segment {
                PathSegment::Index(idx) => *idx,
                PathSegment::Key(key) => key.parse::<usize>().ok()?,
            };
            (idx < items.len()).then(|| items.remove(idx))
        }
        _ => None,
    }
}

/// Leaf paths of a tree as segment lists.
///
/// With `expand_arrays` each array element gets its own index path;
/// otherwise arrays are leaves. Empty objects are leaves too.
pub fn leaves(data: &Value, expand_arrays: bool) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    collect_leaves(data, expand_arrays, &mut Vec::new(), &mut out);
    out
}

fn collect_leaves(
    value: &Value,
    expand_arrays: bool,
    prefix: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_leaves(child, expand_arrays, prefix, out);
                prefix.pop();
            }
        }
        Value::Array(items) if expand_arrays && !items.is_empty() => {
            for (idx, child) in items.iter().enumerate() {
                prefix.push(idx.to_string());
                collect_leaves(child, expand_arrays, prefix, out);
                prefix.pop();
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
        }
    }
}

/// Flatten a tree into dotted leaf paths.
pub fn keys(data: &Value, expand_arrays: bool) -> Vec<String> {
    leaves(data, expand_arrays)
        .into_iter()
        .map(|segments| segments.join("."))
        .collect()
}
