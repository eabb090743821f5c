//! Extension-driven loading and saving of configuration trees
//!
//! Every tree is a `serde_json::Value`, whatever format it came from, so
//! the layers above never care which parser produced it.

use std::path::Path;

use serde_json::{Map, Value};

use crate::{Error, Result, io};

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
    /// An executable descriptor: run the file, parse what it prints.
    Executable,
}

impl Format {
    /// Detect the format from a path's extension.
    ///
    /// - `.yaml`, `.yml` -> YAML
    /// - `.json` -> JSON
    /// - `.toml` -> TOML
    /// - `.exec` -> executable descriptor
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "exec" => Ok(Self::Executable),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    /// Human readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Executable => "executable descriptor",
        }
    }

    /// Parse `content` into a tree.
    ///
    /// Empty documents parse to an empty object. Executable descriptors are
    /// parsed as JSON first and YAML second, since either may be printed.
    pub fn parse(&self, path: &Path, content: &str) -> Result<Value> {
        if is_blank(content) {
            return Ok(Value::Object(Map::new()));
        }

        let parsed = match self {
            Self::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            Self::Executable => serde_json::from_str::<Value>(content)
                .or_else(|_| serde_yaml::from_str::<Value>(content))
                .map_err(|e| e.to_string()),
        };

        match parsed {
            Ok(Value::Null) => Ok(Value::Object(Map::new())),
            Ok(value) => Ok(value),
            Err(message) => Err(Error::Parse {
                path: path.to_path_buf(),
                format: self.name().into(),
                message,
            }),
        }
    }

    /// Render a tree in this format.
    pub fn render(&self, path: &Path, value: &Value) -> Result<String> {
        let rendered = match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|s| s + "\n")
                .map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Executable => Err("executable descriptors are read-only".to_string()),
        };

        rendered.map_err(|message| Error::Serialize {
            path: path.to_path_buf(),
            format: self.name().into(),
            message,
        })
    }
}

/// Whether a document holds nothing but whitespace and `#` comments.
fn is_blank(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

/// Load a tree from a file, detecting the format from its extension.
pub fn load_value(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    let content = io::read_text(path)?;
    format.parse(path, &content)
}

/// Load a tree, treating a missing file as an empty object.
pub fn load_value_or_empty(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    match io::read_text_opt(path)? {
        Some(content) => format.parse(path, &content),
        None => Ok(Value::Object(Map::new())),
    }
}

/// Save a tree to a file atomically, detecting the format from its extension.
pub fn save_value(path: &Path, value: &Value) -> Result<()> {
    let format = Format::from_path(path)?;
    let content = format.render(path, value)?;
    io::write_text(path, &content)
}
