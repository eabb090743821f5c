//! Compiled hooks and tasks.
//!
//! Hooks accumulate: every fragment's locators for an event run, lowest
//! priority first. Tasks are named, so the highest-priority fragment wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fragment::Fragment;

/// Event name to hook locators, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hooks {
    events: BTreeMap<String, Vec<String>>,
}

impl Hooks {
    pub fn compile(fragments: &[Fragment]) -> Self {
        let mut hooks = Self::default();
        for fragment in fragments {
            let Some(section) = fragment.section("hooks") else {
                continue;
            };
            for (event, locators) in section {
                let entry = hooks.events.entry(event.clone()).or_default();
                match locators {
                    Value::String(locator) => entry.push(locator.clone()),
                    Value::Array(items) => {
                        entry.extend(items.iter().filter_map(Value::as_str).map(str::to_string))
                    }
                    _ => {}
                }
            }
        }
        hooks
    }

    /// Locators for `event`, empty when none are registered.
    pub fn get(&self, event: &str) -> &[String] {
        self.events.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.events.values().all(Vec::is_empty)
    }
}

/// Task name to locator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tasks {
    tasks: BTreeMap<String, String>,
}

impl Tasks {
    pub fn compile(fragments: &[Fragment]) -> Self {
        let mut tasks = Self::default();
        for fragment in fragments {
            let Some(section) = fragment.section("tasks") else {
                continue;
            };
            for (name, locator) in section {
                if let Some(locator) = locator.as_str() {
                    tasks.tasks.insert(name.clone(), locator.to_string());
                }
            }
        }
        tasks
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tasks.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
