//! Comment-preserving edits of block-style YAML documents
//!
//! User-facing config files are hand edited, so writing a value back must not
//! throw away comments or reorder keys. [`YamlDocument`] works on lines: it
//! walks block mappings by indentation, replaces or removes just the entry at
//! the target path, and renders the new entry with `serde_yaml`.
//!
//! Documents the line walker cannot navigate (flow collections or sequences
//! along the path) fall back to parse, modify and re-serialize.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::{Format, Result, io};

/// A YAML document held as editable lines.
#[derive(Debug, Clone)]
pub struct YamlDocument {
    path: PathBuf,
    lines: Vec<String>,
}

/// Location of a mapping entry: its key line and the end (exclusive) of its
/// child block.
#[derive(Debug, Clone, Copy)]
struct Entry {
    line: usize,
    end: usize,
    inline: bool,
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    start: usize,
    end: usize,
    indent: usize,
}

/// The structure on the path is not a block mapping.
#[derive(Debug)]
struct Unnavigable;

impl YamlDocument {
    /// Build a document from source text.
    pub fn new(source: &str) -> Self {
        Self {
            path: PathBuf::from("<document>"),
            lines: source.lines().map(str::to_string).collect(),
        }
    }

    /// Read a document from disk; a missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        let source = io::read_text_opt(path)?.unwrap_or_default();
        let mut doc = Self::new(&source);
        doc.path = path.to_path_buf();
        Ok(doc)
    }

    /// Write the document back atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_text(path, &self.render())
    }

    /// Parse the current text into a tree.
    pub fn to_value(&self) -> Result<Value> {
        Format::Yaml.parse(&self.path, &self.render())
    }

    /// Current document text, always newline terminated unless empty.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Set `value` at `path`, creating intermediate mappings as needed.
    pub fn set_in(&mut self, path: &[&str], value: &Value) -> Result<()> {
        if path.is_empty() {
            let rendered = Format::Yaml.render(&self.path, value)?;
            self.lines = rendered.lines().map(str::to_string).collect();
            return Ok(());
        }

        let snapshot = self.lines.clone();
        match self.try_set(path, value) {
            Ok(()) if self.to_value().is_ok() => Ok(()),
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    key = %path.join("."),
                    "YAML document could not be edited in place, re-serializing"
                );
                self.lines = snapshot;
                let mut tree = self.to_value()?;
                set_value(&mut tree, path, value.clone());
                self.replace_with(&tree)
            }
        }
    }

    /// Remove the entry at `path`, returning whether anything was removed.
    pub fn delete_in(&mut self, path: &[&str]) -> Result<bool> {
        if path.is_empty() {
            return Ok(false);
        }

        let snapshot = self.lines.clone();
        match self.try_delete(path) {
            Ok(removed) if self.to_value().is_ok() => Ok(removed),
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    key = %path.join("."),
                    "YAML document could not be edited in place, re-serializing"
                );
                self.lines = snapshot;
                let mut tree = self.to_value()?;
                let removed = delete_value(&mut tree, path);
                self.replace_with(&tree)?;
                Ok(removed)
            }
        }
    }

    fn replace_with(&mut self, tree: &Value) -> Result<()> {
        let rendered = Format::Yaml.render(&self.path, tree)?;
        self.lines = rendered.lines().map(str::to_string).collect();
        Ok(())
    }

    fn try_set(&mut self, path: &[&str], value: &Value) -> std::result::Result<(), Unnavigable> {
        let mut scope = self.root_scope()?;

        for (depth, key) in path.iter().enumerate() {
            let rest = &path[depth + 1..];
            let Some(entry) = self.find_entry(scope, key)? else {
                let at = self.last_content_line(scope.start, scope.end).map_or(scope.start, |l| l + 1);
                let lines = render_entry(scope.indent, key, &nest(rest, value.clone()))?;
                self.lines.splice(at..at, lines);
                return Ok(());
            };

            if entry.inline && !rest.is_empty() {
                // A flow mapping keeps siblings the line walker cannot see
                return Err(Unnavigable);
            }

            if rest.is_empty() {
                let lines = render_entry(scope.indent, key, &nest(rest, value.clone()))?;
                self.lines.splice(entry.line..entry.end, lines);
                return Ok(());
            }

            match self.child_scope(entry)? {
                Some(child) => scope = child,
                None => {
                    // `key:` with nothing under it
                    let lines = render_entry(scope.indent, key, &nest(rest, value.clone()))?;
                    self.lines.splice(entry.line..entry.end, lines);
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn try_delete(&mut self, path: &[&str]) -> std::result::Result<bool, Unnavigable> {
        let mut scope = self.root_scope()?;

        for (depth, key) in path.iter().enumerate() {
            let Some(entry) = self.find_entry(scope, key)? else {
                return Ok(false);
            };

            if depth + 1 == path.len() {
                self.lines.drain(entry.line..entry.end);
                return Ok(true);
            }

            if entry.inline {
                return Err(Unnavigable);
            }

            match self.child_scope(entry)? {
                Some(child) => scope = child,
                None => return Ok(false),
            }
        }

        Ok(false)
    }

    fn root_scope(&self) -> std::result::Result<Scope, Unnavigable> {
        let end = self.lines.len();
        let first = (0..end).find(|&i| is_content(&self.lines[i]) && !is_directive(&self.lines[i]));
        match first {
            None => Ok(Scope {
                start: 0,
                end,
                indent: 0,
            }),
            Some(i) if self.lines[i].trim_start().starts_with('-') => Err(Unnavigable),
            Some(i) => Ok(Scope {
                start: i,
                end,
                indent: indent_of(&self.lines[i]),
            }),
        }
    }

    fn child_scope(&self, entry: Entry) -> std::result::Result<Option<Scope>, Unnavigable> {
        let Some(first) = (entry.line + 1..entry.end).find(|&i| is_content(&self.lines[i])) else {
            return Ok(None);
        };
        if self.lines[first].trim_start().starts_with('-') {
            return Err(Unnavigable);
        }
        Ok(Some(Scope {
            start: first,
            end: entry.end,
            indent: indent_of(&self.lines[first]),
        }))
    }

    fn find_entry(&self, scope: Scope, key: &str) -> std::result::Result<Option<Entry>, Unnavigable> {
        let mut i = scope.start;
        while i < scope.end {
            let line = &self.lines[i];
            if !is_content(line) || is_directive(line) || indent_of(line) != scope.indent {
                i += 1;
                continue;
            }

            let trimmed = line.trim_start();
            if trimmed.starts_with('-') || trimmed.starts_with('{') || trimmed.starts_with('[') {
                return Err(Unnavigable);
            }

            let Some((found, rest)) = split_key(trimmed) else {
                i += 1;
                continue;
            };

            let inline = !strip_comment(rest).trim().is_empty();
            let end = self.entry_end(i, scope, inline);
            if found == key {
                return Ok(Some(Entry { line: i, end, inline }));
            }
            i = end;
        }

        Ok(None)
    }

    /// End (exclusive) of the block owned by the entry on `line`.
    ///
    /// Trailing blank and comment lines are left to whatever follows.
    fn entry_end(&self, line: usize, scope: Scope, inline: bool) -> usize {
        let mut end = line + 1;
        for j in line + 1..scope.end {
            let child = &self.lines[j];
            if !is_content(child) {
                continue;
            }
            let child_indent = indent_of(child);
            let same_level_item =
                child_indent == scope.indent && !inline && child.trim_start().starts_with('-');
            if child_indent > scope.indent || same_level_item {
                end = j + 1;
            } else {
                break;
            }
        }
        end
    }

    fn last_content_line(&self, start: usize, end: usize) -> Option<usize> {
        (start..end).rev().find(|&i| is_content(&self.lines[i]))
    }
}

impl std::fmt::Display for YamlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn is_directive(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed == "---" || trimmed == "..." || trimmed.starts_with('%')
}

/// Split `key: rest` into its key (unquoted) and the remainder.
fn split_key(trimmed: &str) -> Option<(String, &str)> {
    if let Some(quote) = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let close = trimmed[1..].find(quote)? + 1;
        let after = &trimmed[close + 1..];
        let rest = after.strip_prefix(':')?;
        return Some((trimmed[1..close].to_string(), rest));
    }

    let bytes = trimmed.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b':' && (idx + 1 == bytes.len() || bytes[idx + 1] == b' ') {
            return Some((trimmed[..idx].trim_end().to_string(), &trimmed[idx + 1..]));
        }
        if *byte == b'#' && idx > 0 && bytes[idx - 1] == b' ' {
            return None;
        }
    }
    None
}

fn strip_comment(rest: &str) -> &str {
    if rest.trim_start().starts_with('#') {
        return "";
    }
    match rest.find(" #") {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

fn nest(rest: &[&str], value: Value) -> Value {
    rest.iter().rev().fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert((*key).to_string(), inner);
        Value::Object(map)
    })
}

fn render_entry(indent: usize, key: &str, value: &Value) -> std::result::Result<Vec<String>, Unnavigable> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    let rendered = serde_yaml::to_string(&Value::Object(map)).map_err(|_| Unnavigable)?;
    let pad = " ".repeat(indent);
    Ok(rendered
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect())
}

fn set_value(tree: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut cursor = tree;
    for key in parents {
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
        cursor = match cursor {
            Value::Object(map) => map
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    if let Value::Object(map) = cursor {
        map.insert((*last).to_string(), value);
    }
}

fn delete_value(tree: &mut Value, path: &[&str]) -> bool {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return false,
    };
    let mut cursor = tree;
    for key in parents {
        match cursor.get_mut(*key) {
            Some(next) => cursor = next,
            None => return false,
        }
    }
    cursor
        .as_object_mut()
        .is_some_and(|map| map.remove(*last).is_some())
}
