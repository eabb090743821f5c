//! `lando config`

use lando_core::Bootstrap;
use serde_json::Value;

use crate::error::{CliError, Result};

/// Print a configuration value as pretty JSON.
pub fn run_config(bootstrap: &Bootstrap, path: Option<&str>, store: Option<&str>) -> Result<()> {
    let config = bootstrap.config();
    if let Some(name) = store {
        if !config.has_store(name) {
            return Err(CliError::user(format!("Unknown configuration store '{name}'")));
        }
    }

    let selector = match (store, path) {
        (Some(store), Some(path)) => format!("{store}:{path}"),
        (Some(store), None) => format!("{store}:"),
        (None, Some(path)) => path.to_string(),
        (None, None) => String::new(),
    };

    let value = config.get(&selector).ok_or_else(|| {
        CliError::user(format!(
            "No configuration value at '{}'",
            path.unwrap_or_default()
        ))
    })?;
    println!("{}", render(&value));
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
