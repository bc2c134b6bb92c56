//! Variable storage.
//!
//! Plays, tasks and hosts each carry an ordered map of variables. The
//! executor layers them (play vars, task vars, host facts, extra vars) into a
//! single context before rendering a task.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered set of variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    data: IndexMap<String, serde_json::Value>,
}

impl Variables {
    /// Create new empty variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Resolve a dotted path such as `app.config.port`.
    pub fn get_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut parts = path.split('.');
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = match current {
                serde_json::Value::Object(map) => map.get(part)?,
                serde_json::Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Check if variable exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Merge with another variables set (other takes precedence)
    pub fn merge(&mut self, other: &Variables) {
        for (k, v) in &other.data {
            self.data.insert(k.clone(), v.clone());
        }
    }

    /// Iterate over variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.data.iter()
    }

    /// Get all variables as a map
    pub fn as_map(&self) -> &IndexMap<String, serde_json::Value> {
        &self.data
    }

    /// Copy into a `HashMap`, the shape the template engine renders against.
    pub fn to_context(&self) -> HashMap<String, serde_json::Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Check if variables is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of variables
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl FromIterator<(String, serde_json::Value)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}
